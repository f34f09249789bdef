//! Property-based tests for the entity store and snapshot codec.
//!
//! Random sequences of store operations must never leave a link pointing
//! at a folder that does not exist, and an export followed by an import
//! must reproduce the store exactly.

use std::collections::HashSet;

use linknest_core::codec::{export_json, import_json};
use linknest_core::{LinkDraft, LinkPatch, QueryState, SortMode, Store};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    AddFolder(String),
    AddLink {
        title: String,
        tags: Vec<String>,
        folder: Option<usize>,
    },
    MoveLink {
        link: usize,
        folder: Option<usize>,
    },
    RenameFolder(usize, String),
    DeleteFolder(usize),
    DeleteLink(usize),
}

fn arb_name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{0,12}"
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        arb_name().prop_map(Op::AddFolder),
        (
            arb_name(),
            proptest::collection::vec("[a-z]{1,6}", 0..3),
            proptest::option::of(0usize..8),
        )
            .prop_map(|(title, tags, folder)| Op::AddLink { title, tags, folder }),
        (0usize..8, proptest::option::of(0usize..8))
            .prop_map(|(link, folder)| Op::MoveLink { link, folder }),
        (0usize..8, arb_name()).prop_map(|(i, name)| Op::RenameFolder(i, name)),
        (0usize..8).prop_map(Op::DeleteFolder),
        (0usize..8).prop_map(Op::DeleteLink),
    ]
}

/// Pick the nth folder id, wrapping; `None` when there are no folders
fn nth_folder(store: &Store, n: usize) -> Option<uuid::Uuid> {
    let folders = store.folders();
    (!folders.is_empty()).then(|| folders[n % folders.len()].id)
}

fn nth_link(store: &Store, n: usize) -> Option<uuid::Uuid> {
    let links = store.links();
    (!links.is_empty()).then(|| links[n % links.len()].id)
}

fn apply(store: &mut Store, op: Op) {
    match op {
        Op::AddFolder(name) => {
            store.add_folder(name);
        }
        Op::AddLink { title, tags, folder } => {
            let mut draft = LinkDraft::new(format!("https://{}.example", title.len()), title)
                .with_tags(tags);
            draft.folder_id = folder.and_then(|n| nth_folder(store, n));
            store.add_link(draft);
        }
        Op::MoveLink { link, folder } => {
            if let Some(id) = nth_link(store, link) {
                let target = folder.and_then(|n| nth_folder(store, n));
                store.update_link(id, LinkPatch::move_to(target));
            }
        }
        Op::RenameFolder(n, name) => {
            if let Some(id) = nth_folder(store, n) {
                store.update_folder(id, name);
            }
        }
        Op::DeleteFolder(n) => {
            if let Some(id) = nth_folder(store, n) {
                store.delete_folder(id);
            }
        }
        Op::DeleteLink(n) => {
            if let Some(id) = nth_link(store, n) {
                store.delete_link(id);
            }
        }
    }
}

fn assert_integrity(store: &Store) -> Result<(), TestCaseError> {
    let folders: HashSet<_> = store.folders().iter().map(|f| f.id).collect();
    prop_assert_eq!(folders.len(), store.folder_count(), "folder ids must be unique");

    let links: HashSet<_> = store.links().iter().map(|l| l.id).collect();
    prop_assert_eq!(links.len(), store.link_count(), "link ids must be unique");

    for link in store.links() {
        if let Some(folder) = link.folder_id {
            prop_assert!(
                folders.contains(&folder),
                "link {} points at missing folder {}",
                link.id,
                folder
            );
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn folder_references_stay_valid(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut store = Store::in_memory();
        for op in ops {
            apply(&mut store, op);
            assert_integrity(&store)?;
        }
    }

    #[test]
    fn export_then_import_reproduces_store(ops in proptest::collection::vec(arb_op(), 0..30)) {
        let mut store = Store::in_memory();
        for op in ops {
            apply(&mut store, op);
        }

        let json = export_json(&store.snapshot()).unwrap();
        let candidate = import_json(&json).unwrap();
        prop_assert_eq!(candidate.repaired_references(), 0);

        let mut restored = Store::in_memory();
        restored.replace_all(candidate.into_snapshot());
        prop_assert_eq!(restored.snapshot(), store.snapshot());
    }

    #[test]
    fn deletes_are_idempotent(ops in proptest::collection::vec(arb_op(), 1..20), pick in 0usize..8) {
        let mut store = Store::in_memory();
        for op in ops {
            apply(&mut store, op);
        }

        if let Some(id) = nth_link(&store, pick) {
            prop_assert!(store.delete_link(id));
            let after_first = store.snapshot();
            prop_assert!(!store.delete_link(id));
            prop_assert_eq!(store.snapshot(), after_first);
        }

        if let Some(id) = nth_folder(&store, pick) {
            prop_assert!(store.delete_folder(id).is_some());
            let after_first = store.snapshot();
            prop_assert!(store.delete_folder(id).is_none());
            prop_assert_eq!(store.snapshot(), after_first);
        }
    }

    #[test]
    fn query_results_never_depend_on_storage_order(
        ops in proptest::collection::vec(arb_op(), 0..30),
        query in "[a-z]{0,5}",
    ) {
        let mut store = Store::in_memory();
        for op in ops {
            apply(&mut store, op);
        }

        let mut reversed = store.links().to_vec();
        reversed.reverse();

        for sort in [SortMode::DateDesc, SortMode::TitleAsc, SortMode::UrlDesc] {
            let mut state = QueryState::new();
            state.set_sort(sort);
            state.set_query(query.clone());

            let forward: Vec<_> = state.evaluate(store.links()).iter().map(|h| h.link.id).collect();
            let backward: Vec<_> = state.evaluate(&reversed).iter().map(|h| h.link.id).collect();
            prop_assert_eq!(forward, backward);
        }
    }
}
