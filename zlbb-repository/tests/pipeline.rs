//! Submission pipeline against the in-memory archive store.

use std::sync::Arc;

use zlbb_archive::MemoryArchiveStore;
use zlbb_core::{Game, Puzzle, Submission};
use zlbb_games::{IfScore, Infinifactory};
use zlbb_repository::{
    LeaderboardPublisher, MemoryWikiPage, RepositoryError, SolutionRepository, SubmitResult,
    Validated, ValidationError, Validator, validate_submissions,
};

/// Treats the content as the score text, `"unsolved"` fails.
struct ScoreText;

impl Validator<Infinifactory> for ScoreText {
    fn validate(
        &self,
        _: &Puzzle,
        content: &str,
    ) -> Result<Validated<IfScore>, ValidationError> {
        if content.trim() == "unsolved" {
            return Err(ValidationError::new("the solution does not solve the puzzle"));
        }
        let score =
            Infinifactory::parse_score(content).map_err(|e| ValidationError::new(e.to_string()))?;
        Ok(Validated {
            score,
            content: content.trim().to_string(),
        })
    }
}

type Repository = SolutionRepository<Infinifactory, MemoryArchiveStore>;

fn repository() -> Repository {
    SolutionRepository::new(MemoryArchiveStore::new(), Arc::new(ScoreText))
}

fn puzzle() -> &'static Puzzle {
    Infinifactory::find_puzzle("1-1").unwrap()
}

fn solved(author: &str, score: &str) -> Submission<IfScore> {
    Submission::new("1-1", author).with_content(score)
}

fn authors(repo: &Repository) -> Vec<String> {
    repo.frontier(puzzle())
        .unwrap()
        .solutions()
        .iter()
        .map(|s| s.author.clone())
        .collect()
}

#[test]
fn incomparable_then_dominating_submissions() {
    let repo = repository();

    let first = repo.submit(solved("a", "100/10/5")).unwrap();
    match &first {
        SubmitResult::Accepted {
            categories,
            evicted,
            ..
        } => {
            assert_eq!(categories.len(), 12);
            assert!(evicted.is_empty());
        }
        other => panic!("expected Accepted, got {other:?}"),
    }

    let second = repo.submit(solved("b", "120/8/5")).unwrap();
    assert!(second.is_accepted());
    assert_eq!(repo.find_best(puzzle(), "CF").unwrap().unwrap().author, "a");
    assert_eq!(repo.find_best(puzzle(), "fc").unwrap().unwrap().author, "b");
    assert_eq!(authors(&repo), vec!["a", "b"]);

    match repo.submit(solved("c", "90/7/5")).unwrap() {
        SubmitResult::Accepted {
            categories,
            evicted,
            record,
        } => {
            assert_eq!(categories.len(), 12);
            assert_eq!(evicted.len(), 2);
            assert_eq!(
                record.archive_link.as_deref(),
                Some("memory:///training/1-1/90c-7f-5b.txt")
            );
        }
        other => panic!("expected Accepted, got {other:?}"),
    }
    assert_eq!(authors(&repo), vec!["c"]);

    let files = repo.store().pushed_files().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(
        repo.store().commit_messages().unwrap(),
        vec![
            "1-1 100c/10f/5b by a",
            "1-1 120c/8f/5b by b",
            "1-1 90c/7f/5b by c",
        ]
    );
    assert_eq!(repo.store().push_count(), 3);
}

#[test]
fn placeholder_is_upgraded_in_place() {
    let repo = repository();
    let placeholder = Submission::new("1-1", "X").with_score(IfScore::new(50, 5, 5));

    match repo.submit(placeholder).unwrap() {
        SubmitResult::Accepted { record, .. } => {
            assert_eq!(record.archive_link, None);
            assert_eq!(record.link(), None);
        }
        other => panic!("expected Accepted, got {other:?}"),
    }

    let upgrade = solved("X", "50/5/5").with_display_link("https://example.com/50.gif");
    match repo.submit(upgrade).unwrap() {
        SubmitResult::Accepted {
            record, evicted, ..
        } => {
            assert!(evicted.is_empty());
            assert_eq!(
                record.archive_link.as_deref(),
                Some("memory:///training/1-1/50c-5f-5b.txt")
            );
            assert_eq!(record.display_links, vec!["https://example.com/50.gif"]);
        }
        other => panic!("expected Accepted, got {other:?}"),
    }

    let frontier = repo.frontier(puzzle()).unwrap();
    assert_eq!(frontier.len(), 1);
    assert!(!frontier.solutions()[0].is_placeholder());
}

#[test]
fn identical_resubmission_is_a_duplicate() {
    let repo = repository();

    assert!(repo.submit(solved("a", "100/10/5")).unwrap().is_accepted());
    let again = repo.submit(solved("a", "100/10/5")).unwrap();

    assert!(matches!(again, SubmitResult::Duplicate { .. }));
    assert_eq!(repo.frontier(puzzle()).unwrap().len(), 1);
    assert_eq!(repo.store().commit_count(), 1);
}

#[test]
fn dominated_submission_leaves_archive_untouched() {
    let repo = repository();
    repo.submit(solved("a", "90/7/5")).unwrap();

    match repo.submit(solved("b", "100/10/5")).unwrap() {
        SubmitResult::Dominated { by } => {
            assert_eq!(by.len(), 1);
            assert_eq!(by[0].author, "a");
        }
        other => panic!("expected Dominated, got {other:?}"),
    }
    assert_eq!(repo.store().commit_count(), 1);
}

#[test]
fn validation_failures_never_touch_the_archive() {
    let repo = repository();

    let mismatch = solved("a", "100/10/5").with_score(IfScore::new(1, 1, 1));
    let unsolved = solved("a", "unsolved");
    let empty = Submission::new("1-1", "a");

    for submission in [mismatch, unsolved, empty] {
        let result = repo.submit(submission).unwrap();
        assert!(matches!(result, SubmitResult::Failure { .. }), "{result:?}");
    }
    assert_eq!(repo.store().commit_count(), 0);
    assert_eq!(repo.store().push_count(), 0);
}

#[test]
fn failed_commit_discards_the_change() {
    let repo = repository();
    repo.submit(solved("a", "100/10/5")).unwrap();

    repo.store().fail_next_commit();
    let err = repo.submit(solved("b", "90/7/5")).unwrap_err();

    assert!(matches!(err, RepositoryError::Persistence(_)));
    assert_eq!(authors(&repo), vec!["a"]);

    // A retry observes the last committed state and succeeds.
    match repo.submit(solved("b", "90/7/5")).unwrap() {
        SubmitResult::Accepted { evicted, .. } => assert_eq!(evicted.len(), 1),
        other => panic!("expected Accepted, got {other:?}"),
    }
    assert_eq!(authors(&repo), vec!["b"]);
}

#[test]
fn failed_push_discards_the_commit() {
    let repo = repository();

    repo.store().fail_next_push();
    let err = repo.submit(solved("a", "100/10/5")).unwrap_err();

    assert!(matches!(err, RepositoryError::Persistence(_)));
    assert!(repo.frontier(puzzle()).unwrap().is_empty());
    assert!(repo.store().pushed_files().unwrap().is_empty());
    assert_eq!(repo.store().commit_count(), 0);
}

#[test]
fn batch_applies_items_in_order_and_pushes_once() {
    let repo = repository();
    let items = validate_submissions::<Infinifactory, _>(
        &ScoreText,
        vec![
            solved("a", "100/10/5"),
            solved("x", "unsolved"),
            solved("b", "90/7/5"),
            solved("c", "95/9/5"),
        ],
    )
    .unwrap();

    let results = repo.submit_all(items).unwrap();

    assert!(results[0].is_accepted());
    assert!(matches!(results[1], SubmitResult::Failure { .. }));
    match &results[2] {
        SubmitResult::Accepted { evicted, .. } => assert_eq!(evicted[0].author, "a"),
        other => panic!("expected Accepted, got {other:?}"),
    }
    assert!(matches!(results[3], SubmitResult::Dominated { .. }));

    assert_eq!(repo.store().commit_count(), 2);
    assert_eq!(repo.store().push_count(), 1);
    assert_eq!(authors(&repo), vec!["b"]);
}

#[test]
fn batch_persistence_failure_discards_every_item() {
    let repo = repository();
    let items = validate_submissions::<Infinifactory, _>(
        &ScoreText,
        vec![solved("a", "100/10/5"), solved("b", "120/8/5")],
    )
    .unwrap();

    repo.store().fail_next_push();
    let err = repo.submit_all(items).unwrap_err();

    assert!(matches!(err, RepositoryError::Persistence(_)));
    assert!(repo.frontier(puzzle()).unwrap().is_empty());
    assert_eq!(repo.store().commit_count(), 0);
}

#[test]
fn oversized_batch_is_rejected_up_front() {
    let repo = repository();
    let submissions = (0..51)
        .map(|n| solved("a", &format!("{}/10/5", 100 + n)))
        .collect();

    let err = repo.submit_batch(submissions).unwrap_err();

    assert!(matches!(err, RepositoryError::BatchRejected(_)));
    assert_eq!(repo.store().commit_count(), 0);
}

#[test]
fn category_holder_queries() {
    let repo = repository();
    repo.submit(solved("a", "100/10/5")).unwrap();
    repo.submit(solved("b", "120/8/5")).unwrap();
    // Incomparable with both, best in no category.
    repo.submit(solved("c", "110/9/6")).unwrap();

    let holders = repo.find_category_holders(puzzle(), false).unwrap();
    let everyone = repo.find_category_holders(puzzle(), true).unwrap();

    assert_eq!(holders.len(), 2);
    assert_eq!(everyone.len(), 3);
    assert!(everyone.iter().any(|h| h.record.author == "c" && h.categories.is_empty()));

    let err = repo.find_best(puzzle(), "XYZ").unwrap_err();
    assert!(matches!(err, RepositoryError::Core(_)));
}

#[test]
fn accepted_submission_republishes_leaderboard() {
    let page = Arc::new(MemoryWikiPage::new(
        "| Training Routine 1 | |\n\n| Training Routine 2 | keep |\n",
    ));
    let repo = repository().with_publisher(LeaderboardPublisher::new(page.clone()));

    repo.submit(solved("a", "100/10/5")).unwrap();

    let text = page.text();
    assert!(text.starts_with(
        "| Training Routine 1 | [(**100c**/10f/5b)](memory:///training/1-1/100c-10f-5b.txt)"
    ));
    assert!(text.ends_with("\n\n| Training Routine 2 | keep |\n"));
    assert_eq!(page.update_messages().len(), 1);

    // Nothing changed since the last render.
    assert!(!repo.rebuild_leaderboard(puzzle()).unwrap());
}

#[test]
fn publisher_failure_does_not_fail_submission() {
    let page = Arc::new(MemoryWikiPage::new("| Training Routine 1 | |\n"));
    let repo = repository().with_publisher(LeaderboardPublisher::new(page.clone()));

    page.fail_next_update();
    assert!(repo.submit(solved("a", "100/10/5")).unwrap().is_accepted());
    assert_eq!(page.text(), "| Training Routine 1 | |\n");

    assert!(repo.rebuild_leaderboard(puzzle()).unwrap());
    assert!(page.text().contains("100c"));
}

#[test]
fn concurrent_submissions_keep_the_frontier_consistent() {
    let repo = repository();
    let scores: Vec<String> = (0..8)
        .flat_map(|i| {
            [
                format!("{}/{}/5", 100 + i, 20 - i),
                format!("{}/{}/4", 130 - i, 10 + i),
            ]
        })
        .collect();

    let results: Vec<SubmitResult<IfScore>> = std::thread::scope(|scope| {
        let handles: Vec<_> = scores
            .iter()
            .enumerate()
            .map(|(n, score)| {
                let repo = &repo;
                scope.spawn(move || repo.submit(solved(&format!("p{n}"), score)).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let accepted = results.iter().filter(|r| r.is_accepted()).count();
    assert_eq!(repo.store().commit_count(), accepted);
    assert_eq!(repo.store().push_count(), accepted);

    let frontier = repo.frontier(puzzle()).unwrap();
    assert!(frontier.is_non_dominated(Infinifactory::metrics()));
    for category in Infinifactory::supported_categories(puzzle()) {
        assert!(frontier.holder(category.id).is_some(), "{} has no holder", category.id);
    }
}
