//! Frontier marshalling against the in-memory store.

use std::path::{Path, PathBuf};

use zlbb_archive::marshal::{
    marshal_solution, puzzle_dir, read_frontier, solution_path, unmarshal_solution,
    write_frontier,
};
use zlbb_archive::{ArchiveStore, Error, MemoryArchiveStore, Snapshot, WriteSession};
use zlbb_core::{ArchiveRules, DefaultDuplicatePolicy, Frontier, Game, Insertion, Solution};
use zlbb_games::{FpScore, ForbiddenPath, IfScore, Infinifactory};

fn if_puzzle() -> &'static zlbb_core::Puzzle {
    Infinifactory::find_puzzle("1-1").unwrap()
}

fn with_rules<T>(f: impl FnOnce(&ArchiveRules<'_, IfScore>) -> T) -> T {
    let categories = Infinifactory::supported_categories(if_puzzle());
    let rules = ArchiveRules::new(Infinifactory::metrics(), &categories, &DefaultDuplicatePolicy);
    f(&rules)
}

#[test]
fn solution_file_layout() {
    let score = IfScore::new(100, 10, 5).with_gra();
    let solution = Solution::new(score, "someone", Some("data".into()))
        .with_display_link("https://example.com/run.gif");

    let text = marshal_solution::<Infinifactory>(&solution).unwrap();

    assert!(text.starts_with("+++\nauthor = \"someone\"\n"));
    assert!(text.ends_with("+++\ndata"));
    assert_eq!(
        solution_path::<Infinifactory>(if_puzzle(), &solution.score),
        PathBuf::from("training/1-1/100c-10f-5bG.txt")
    );

    let parsed = unmarshal_solution::<Infinifactory>(Path::new("x.txt"), &text).unwrap();
    assert_eq!(parsed, solution);
}

#[test]
fn placeholder_has_empty_body() {
    let placeholder = Solution::new(FpScore::new(3, 1, 20, 0), "someone", None);

    let text = marshal_solution::<ForbiddenPath>(&placeholder).unwrap();
    assert!(text.ends_with("+++\n"));

    let parsed = unmarshal_solution::<ForbiddenPath>(Path::new("x.txt"), &text).unwrap();
    assert!(parsed.is_placeholder());
    assert!(parsed.display_links.is_empty());
}

#[test]
fn empty_content_is_not_written_as_a_placeholder() {
    let solution = Solution::new(FpScore::new(3, 1, 20, 0), "someone", Some(String::new()));

    let err = marshal_solution::<ForbiddenPath>(&solution).unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)), "got {err:?}");
}

#[test]
fn garbage_file_is_reported_with_its_path() {
    let err =
        unmarshal_solution::<ForbiddenPath>(Path::new("g/p/bad.txt"), "no header").unwrap_err();
    match err {
        Error::Unmarshal { path, .. } => assert_eq!(path, PathBuf::from("g/p/bad.txt")),
        other => panic!("expected Unmarshal, got {other:?}"),
    }
}

#[test]
fn write_then_read_frontier_recomputes_categories() {
    let store = MemoryArchiveStore::new();
    let puzzle = if_puzzle();

    let (first, second) = with_rules(|rules| {
        let first = match Frontier::new().insert(
            Solution::new(IfScore::new(100, 10, 5), "a", Some("one".into())),
            rules,
        ) {
            Insertion::Accepted { frontier, .. } => frontier,
            other => panic!("unexpected {other:?}"),
        };
        let second = match first.insert(
            Solution::new(IfScore::new(120, 8, 5), "b", Some("two".into())),
            rules,
        ) {
            Insertion::Accepted { frontier, .. } => frontier,
            other => panic!("unexpected {other:?}"),
        };
        (first, second)
    });

    {
        let mut session = store.write_access().unwrap();
        write_frontier::<Infinifactory>(&mut session, puzzle, &Frontier::new(), &first).unwrap();
        session.commit("first").unwrap();
        write_frontier::<Infinifactory>(&mut session, puzzle, &first, &second).unwrap();
        session.commit("second").unwrap();
    }

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.list(&puzzle_dir(puzzle)).unwrap().len(), 2);

    let reloaded =
        with_rules(|rules| read_frontier::<Infinifactory>(&snapshot, puzzle, rules)).unwrap();
    assert_eq!(reloaded, second);
    assert_eq!(reloaded.holder("FC").unwrap().author, "b");
}

#[test]
fn write_frontier_removes_evicted_files() {
    let store = MemoryArchiveStore::new();
    let puzzle = if_puzzle();

    let (old, new) = with_rules(|rules| {
        let old = Frontier::from_solutions(
            vec![
                Solution::new(IfScore::new(100, 10, 5), "a", None),
                Solution::new(IfScore::new(120, 8, 5), "b", None),
            ],
            rules,
        );
        let new = Frontier::from_solutions(
            vec![Solution::new(IfScore::new(90, 7, 5), "c", None)],
            rules,
        );
        (old, new)
    });

    let mut session = store.write_access().unwrap();
    write_frontier::<Infinifactory>(&mut session, puzzle, &Frontier::new(), &old).unwrap();
    write_frontier::<Infinifactory>(&mut session, puzzle, &old, &new).unwrap();

    let files = session.list(&puzzle_dir(puzzle)).unwrap();
    assert_eq!(files, vec![PathBuf::from("training/1-1/90c-7f-5b.txt")]);
}

#[test]
fn misnamed_file_is_invalid_data() {
    let text = marshal_solution::<Infinifactory>(&Solution::new(
        IfScore::new(1, 2, 3),
        "a",
        None,
    ))
    .unwrap();
    let store = MemoryArchiveStore::with_files([("training/1-1/9c-9f-9b.txt", text)]);
    let snapshot = store.snapshot().unwrap();

    let err = with_rules(|rules| read_frontier::<Infinifactory>(&snapshot, if_puzzle(), rules))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)));
}
