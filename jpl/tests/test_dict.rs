use std::collections::HashMap;

use jpl::dict::{HashDict, InsertError};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    InsertIfAbsent(usize, u32),
    InsertOrReplace(usize, u32),
    Remove(usize),
    Get(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<prop::sample::Index>(), any::<u32>()).prop_map(|(i, v)| Op::InsertIfAbsent(i.index(usize::MAX), v)),
        (any::<prop::sample::Index>(), any::<u32>()).prop_map(|(i, v)| Op::InsertOrReplace(i.index(usize::MAX), v)),
        any::<prop::sample::Index>().prop_map(|i| Op::Remove(i.index(usize::MAX))),
        any::<prop::sample::Index>().prop_map(|i| Op::Get(i.index(usize::MAX))),
    ]
}

proptest! {
    /// Every operation agrees with the standard library map.
    #[test]
    fn test_matches_hash_map(
        keys in prop::collection::vec("[a-z_]{1,8}", 1..64),
        ops in prop::collection::vec(op(), 0..400),
    ) {
        let mut dict = HashDict::with_capacity(7);
        let mut model: HashMap<&str, u32> = HashMap::new();

        for op in ops {
            match op {
                Op::InsertIfAbsent(i, value) => {
                    let key = keys[i % keys.len()].as_str();
                    let expected = match model.get(key) {
                        Some(first) => Err(InsertError::Occupied(*first)),
                        None => {
                            model.insert(key, value);
                            Ok(())
                        }
                    };
                    prop_assert_eq!(dict.insert_if_absent(key, value), expected);
                }
                Op::InsertOrReplace(i, value) => {
                    let key = keys[i % keys.len()].as_str();
                    prop_assert_eq!(dict.insert_or_replace(key, value), model.insert(key, value));
                }
                Op::Remove(i) => {
                    let key = keys[i % keys.len()].as_str();
                    prop_assert_eq!(dict.remove(key), model.remove(key));
                }
                Op::Get(i) => {
                    let key = keys[i % keys.len()].as_str();
                    prop_assert_eq!(dict.try_get(key), model.get(key).copied());
                }
            }
            prop_assert_eq!(dict.len(), model.len());
        }

        for (key, value) in &model {
            prop_assert_eq!(dict.try_get(*key), Some(*value));
        }
    }

    /// Growing past three quarters load keeps every live entry.
    #[test]
    fn test_growth_keeps_entries(count in 200_usize..2000) {
        let keys: Vec<String> = (0..count).map(|i| format!("v{i}")).collect();
        let mut dict = HashDict::new();

        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(dict.insert_if_absent(key.as_str(), i), Ok(()));
            prop_assert!(dict.len() * 4 <= dict.capacity() * 3);
        }
        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(dict.try_get(key.as_str()), Some(i));
        }
    }
}
