use proptest::prelude::*;
use sortdir::duplicates::{EquivalenceMethod, scan};
use sortdir::file_category::CategoryRuleTable;
use sortdir::hasher;
use sortdir::NoProgress;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use tempfile::TempDir;

proptest! {
    #[test]
    fn test_classify_is_deterministic_and_total(name in "\\PC{0,40}") {
        let table = CategoryRuleTable::default();
        let first = table.classify(&name);
        let second = table.classify(&name);
        prop_assert_eq!(first, second);
        if let Some(category) = first {
            prop_assert!(table.contains(category));
        }
    }

    #[test]
    fn test_classify_ignores_extension_case(stem in "[a-z]{1,8}", idx in 0usize..7) {
        let table = CategoryRuleTable::default();
        let rule = table.iter().nth(idx).expect("seven built-in categories");
        let ext = &rule.extensions()[0];
        let lower = format!("{}{}", stem, ext);
        let upper = format!("{}{}", stem, ext.to_uppercase());
        prop_assert_eq!(table.classify(&lower), Some(rule.name()));
        prop_assert_eq!(table.classify(&upper), Some(rule.name()));
    }

    #[test]
    fn test_hash_depends_only_on_content(content in prop::collection::vec(any::<u8>(), 0..10_000)) {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        fs::write(&a, &content).unwrap();
        fs::write(&b, &content).unwrap();

        prop_assert_eq!(hasher::hash_file(&a).unwrap(), hasher::hash_file(&b).unwrap());
        prop_assert_eq!(hasher::hash_file(&a).unwrap(), hasher::hash_reader(content.as_slice()).unwrap());
    }

    #[test]
    fn test_content_groups_are_identical_classes(contents in prop::collection::vec(0u8..4, 0..12)) {
        let dir = TempDir::new().unwrap();
        let mut expected: BTreeMap<u8, BTreeSet<String>> = BTreeMap::new();
        for (i, c) in contents.iter().enumerate() {
            let name = format!("f{:02}.dat", i);
            fs::write(dir.path().join(&name), [*c]).unwrap();
            expected.entry(*c).or_default().insert(name);
        }

        let report = scan(dir.path(), EquivalenceMethod::ByContent, &NoProgress).unwrap();
        let found: BTreeSet<BTreeSet<String>> = report
            .groups
            .iter()
            .map(|g| g.files.iter().cloned().collect())
            .collect();
        let wanted: BTreeSet<BTreeSet<String>> = expected
            .into_values()
            .filter(|names| names.len() >= 2)
            .collect();

        prop_assert_eq!(found, wanted);
        prop_assert_eq!(report.files_scanned, contents.len());
    }

    #[test]
    fn test_name_groups_are_case_folded_classes(names in prop::collection::btree_set("[a-cA-C]{1,3}\\.txt", 0..10)) {
        let dir = TempDir::new().unwrap();
        for name in &names {
            fs::write(dir.path().join(name), name.as_bytes()).unwrap();
        }
        // Case-insensitive filesystems merge names that differ only in case.
        prop_assume!(fs::read_dir(dir.path()).unwrap().count() == names.len());

        let mut expected: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for name in &names {
            expected.entry(name.to_lowercase()).or_default().insert(name.clone());
        }
        let wanted: BTreeMap<String, BTreeSet<String>> = expected
            .into_iter()
            .filter(|(_, members)| members.len() >= 2)
            .collect();

        let report = scan(dir.path(), EquivalenceMethod::ByName, &NoProgress).unwrap();
        let found: BTreeMap<String, BTreeSet<String>> = report
            .groups
            .iter()
            .map(|g| (g.key.clone(), g.files.iter().cloned().collect()))
            .collect();

        prop_assert_eq!(found, wanted);
    }
}
