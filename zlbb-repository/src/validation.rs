//! Validation seam between raw submissions and the frontier.
//!
//! Parsing a game's export and recovering its score is the job of an
//! external [`Validator`]. This module checks what it returns against the
//! submission and turns the result into a candidate [`Solution`].

use thiserror::Error;
use zlbb_core::{Game, Puzzle, Solution, StringFormat, Submission, format_score};

/// Largest batch a validator accepts in one call.
pub const MAX_BATCH_SIZE: usize = 50;

/// User-facing reason a submission was rejected. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Score and canonicalized content recovered from a solution export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<S> {
    pub score: S,
    pub content: String,
}

/// External validator of solution exports.
pub trait Validator<G: Game>: Send + Sync {
    fn validate(
        &self,
        puzzle: &Puzzle,
        content: &str,
    ) -> Result<Validated<G::Score>, ValidationError>;

    /// Validates every item, isolating failures per item.
    ///
    /// # Errors
    ///
    /// Rejects the whole batch when it holds more than [`MAX_BATCH_SIZE`]
    /// items.
    fn validate_batch(
        &self,
        items: &[(&Puzzle, &str)],
    ) -> Result<Vec<Result<Validated<G::Score>, ValidationError>>, ValidationError> {
        check_batch_size(items.len())?;
        Ok(items
            .iter()
            .map(|(puzzle, content)| self.validate(puzzle, content))
            .collect())
    }
}

/// Outcome of validating one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult<S> {
    Valid {
        puzzle: &'static Puzzle,
        solution: Solution<S>,
    },
    Invalid {
        /// The puzzle as the submitter named it.
        puzzle: String,
        author: String,
        message: String,
    },
}

impl<S> ValidationResult<S> {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid { .. })
    }
}

fn check_batch_size(len: usize) -> Result<(), ValidationError> {
    if len > MAX_BATCH_SIZE {
        return Err(ValidationError::new(format!(
            "at most {MAX_BATCH_SIZE} solutions can be submitted at once, got {len}"
        )));
    }
    Ok(())
}

/// Resolves a puzzle by id first, then by display name.
fn resolve_puzzle<G: Game>(query: &str) -> Result<&'static Puzzle, ValidationError> {
    G::find_puzzle(query)
        .or_else(|_| G::find_puzzle_by_name(query))
        .map_err(|e| ValidationError::new(e.to_string()))
}

/// Turns a submission into a candidate solution.
///
/// With content, the validator recovers the score and any claimed score
/// must match it. Without content, the claimed score is required and the
/// candidate is a placeholder.
pub fn validate_submission<G, V>(
    validator: &V,
    submission: Submission<G::Score>,
) -> ValidationResult<G::Score>
where
    G: Game,
    V: Validator<G> + ?Sized,
{
    let puzzle = resolve_puzzle::<G>(&submission.puzzle);
    let validated = match (&puzzle, &submission.content) {
        (Ok(puzzle), Some(content)) => Some(validator.validate(puzzle, content)),
        _ => None,
    };
    conclude::<G>(submission, puzzle, validated)
}

/// Validates a batch of submissions, isolating failures per item.
///
/// Every solution file of the batch goes to the validator in a single
/// [`Validator::validate_batch`] call.
///
/// # Errors
///
/// Rejects the whole batch when it holds more than [`MAX_BATCH_SIZE`] items,
/// when the validator refuses it, or when the validator answers with the
/// wrong number of results.
pub fn validate_submissions<G, V>(
    validator: &V,
    submissions: Vec<Submission<G::Score>>,
) -> Result<Vec<ValidationResult<G::Score>>, ValidationError>
where
    G: Game,
    V: Validator<G> + ?Sized,
{
    check_batch_size(submissions.len())?;
    let puzzles: Vec<_> = submissions
        .iter()
        .map(|s| resolve_puzzle::<G>(&s.puzzle))
        .collect();

    let items: Vec<(&Puzzle, &str)> = submissions
        .iter()
        .zip(&puzzles)
        .filter_map(|(s, puzzle)| Some((*puzzle.as_ref().ok()?, s.content.as_deref()?)))
        .collect();
    let expected = items.len();
    let validated = validator.validate_batch(&items)?;
    if validated.len() != expected {
        return Err(ValidationError::new(format!(
            "validator returned {} results for {expected} solutions",
            validated.len()
        )));
    }

    let mut validated = validated.into_iter();
    Ok(submissions
        .into_iter()
        .zip(puzzles)
        .map(|(submission, puzzle)| {
            let outcome = match (&puzzle, &submission.content) {
                (Ok(_), Some(_)) => validated.next(),
                _ => None,
            };
            conclude::<G>(submission, puzzle, outcome)
        })
        .collect())
}

/// Checks a submission against what the validator recovered from its
/// content, if it had any.
fn conclude<G: Game>(
    submission: Submission<G::Score>,
    puzzle: Result<&'static Puzzle, ValidationError>,
    validated: Option<Result<Validated<G::Score>, ValidationError>>,
) -> ValidationResult<G::Score> {
    let Submission {
        puzzle: query,
        claimed_score,
        author,
        display_link,
        content: _,
    } = submission;

    let checked = puzzle.and_then(|puzzle| {
        let solution = match (validated, claimed_score) {
            (Some(validated), claimed) => {
                let validated = validated?;
                // An empty file would be stored as a placeholder.
                if validated.content.is_empty() {
                    return Err(ValidationError::new("the solution file is empty"));
                }
                if let Some(claimed) = claimed.filter(|c| *c != validated.score) {
                    let show =
                        |s: &G::Score| format_score(s, G::metrics(), StringFormat::Plain, None);
                    return Err(ValidationError::new(format!(
                        "claimed score {} does not match the solution's score {}",
                        show(&claimed),
                        show(&validated.score)
                    )));
                }
                Solution::new(validated.score, author.as_str(), Some(validated.content))
            }
            (None, Some(claimed)) => Solution::new(claimed, author.as_str(), None),
            (None, None) => {
                return Err(ValidationError::new(
                    "a score is required when no solution file is given",
                ));
            }
        };
        Ok((puzzle, solution))
    });

    match checked {
        Ok((puzzle, solution)) => ValidationResult::Valid {
            puzzle,
            solution: match display_link {
                Some(link) => solution.with_display_link(link),
                None => solution,
            },
        },
        Err(e) => ValidationResult::Invalid {
            puzzle: query,
            author,
            message: e.message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zlbb_games::{IfScore, Infinifactory};

    struct ScoreText;

    impl Validator<Infinifactory> for ScoreText {
        fn validate(
            &self,
            _: &Puzzle,
            content: &str,
        ) -> Result<Validated<IfScore>, ValidationError> {
            let score = Infinifactory::parse_score(content)
                .map_err(|e| ValidationError::new(e.to_string()))?;
            Ok(Validated {
                score,
                content: content.trim().to_string(),
            })
        }
    }

    fn submission() -> Submission<IfScore> {
        Submission::new("1-1", "someone")
    }

    #[test]
    fn content_without_claim_is_valid() {
        let result = validate_submission::<Infinifactory, _>(
            &ScoreText,
            submission().with_content(" 100/10/5 ").with_display_link("https://gif"),
        );

        match result {
            ValidationResult::Valid { puzzle, solution } => {
                assert_eq!(puzzle.id, "1-1");
                assert_eq!(solution.score, IfScore::new(100, 10, 5));
                assert_eq!(solution.content.as_deref(), Some("100/10/5"));
                assert_eq!(solution.display_links, vec!["https://gif".to_string()]);
            }
            other => panic!("expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_claim_is_invalid() {
        let result = validate_submission::<Infinifactory, _>(
            &ScoreText,
            submission()
                .with_score(IfScore::new(99, 10, 5))
                .with_content("100/10/5"),
        );

        match result {
            ValidationResult::Invalid { message, author, .. } => {
                assert_eq!(author, "someone");
                assert_eq!(
                    message,
                    "claimed score 99c/10f/5b does not match the solution's score 100c/10f/5b"
                );
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn claim_without_content_is_a_placeholder() {
        let result = validate_submission::<Infinifactory, _>(
            &ScoreText,
            submission().with_score(IfScore::new(100, 10, 5)),
        );

        match result {
            ValidationResult::Valid { solution, .. } => assert!(solution.is_placeholder()),
            other => panic!("expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn nothing_to_validate_is_invalid() {
        let result = validate_submission::<Infinifactory, _>(&ScoreText, submission());

        assert!(!result.is_valid());
    }

    #[test]
    fn puzzle_can_be_named_by_display_name() {
        let result = validate_submission::<Infinifactory, _>(
            &ScoreText,
            Submission::new("sealed chamber", "someone").with_content("10/10/10"),
        );

        match result {
            ValidationResult::Valid { puzzle, .. } => assert_eq!(puzzle.id, "2-4"),
            other => panic!("expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn unknown_puzzle_is_invalid() {
        let result = validate_submission::<Infinifactory, _>(
            &ScoreText,
            Submission::new("no such puzzle", "someone").with_content("1/1/1"),
        );

        match result {
            ValidationResult::Invalid { puzzle, message, .. } => {
                assert_eq!(puzzle, "no such puzzle");
                assert!(message.contains("unknown puzzle"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn validator_errors_become_invalid_results() {
        let result = validate_submission::<Infinifactory, _>(
            &ScoreText,
            submission().with_content("not a score"),
        );

        assert!(!result.is_valid());
    }

    #[test]
    fn oversized_batch_is_rejected() {
        let puzzle = Infinifactory::find_puzzle("1-1").unwrap();
        let items: Vec<(&Puzzle, &str)> = vec![(puzzle, "1/1/1"); MAX_BATCH_SIZE + 1];

        let err = ScoreText.validate_batch(&items).unwrap_err();
        assert_eq!(
            err.message,
            "at most 50 solutions can be submitted at once, got 51"
        );

        let results = ScoreText.validate_batch(&items[..2]).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn batch_isolates_failures() {
        let submissions = vec![
            submission().with_content("1/1/1"),
            submission(),
            submission().with_content("2/2/2"),
        ];

        let results = validate_submissions::<Infinifactory, _>(&ScoreText, submissions).unwrap();

        let valid: Vec<bool> = results.iter().map(ValidationResult::is_valid).collect();
        assert_eq!(valid, vec![true, false, true]);
    }

    #[test]
    fn empty_solution_file_is_invalid() {
        let result =
            validate_submission::<Infinifactory, _>(&EmptyContent, submission().with_content("x"));

        match result {
            ValidationResult::Invalid { message, .. } => {
                assert_eq!(message, "the solution file is empty");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    /// Recovers a score but canonicalizes the content away.
    struct EmptyContent;

    impl Validator<Infinifactory> for EmptyContent {
        fn validate(&self, _: &Puzzle, _: &str) -> Result<Validated<IfScore>, ValidationError> {
            Ok(Validated {
                score: IfScore::new(1, 1, 1),
                content: String::new(),
            })
        }
    }

    /// Only answers whole batches, the way an external batch process does.
    #[derive(Default)]
    struct BatchOnly {
        batches: AtomicUsize,
        drop_last: bool,
    }

    impl Validator<Infinifactory> for BatchOnly {
        fn validate(&self, _: &Puzzle, _: &str) -> Result<Validated<IfScore>, ValidationError> {
            Err(ValidationError::new("single validation is unsupported"))
        }

        fn validate_batch(
            &self,
            items: &[(&Puzzle, &str)],
        ) -> Result<Vec<Result<Validated<IfScore>, ValidationError>>, ValidationError> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            let mut results: Vec<_> = items
                .iter()
                .map(|(puzzle, content)| ScoreText.validate(puzzle, content))
                .collect();
            if self.drop_last {
                results.pop();
            }
            Ok(results)
        }
    }

    #[test]
    fn batch_goes_through_validate_batch_once() {
        let validator = BatchOnly::default();
        let submissions = vec![
            submission().with_content("1/1/1"),
            Submission::new("no such puzzle", "someone").with_content("3/3/3"),
            submission().with_score(IfScore::new(4, 4, 4)),
            submission().with_content("2/2/2"),
        ];

        let results = validate_submissions::<Infinifactory, _>(&validator, submissions).unwrap();

        assert_eq!(validator.batches.load(Ordering::SeqCst), 1);
        let scores: Vec<Option<IfScore>> = results
            .iter()
            .map(|r| match r {
                ValidationResult::Valid { solution, .. } => Some(solution.score),
                ValidationResult::Invalid { .. } => None,
            })
            .collect();
        assert_eq!(
            scores,
            vec![
                Some(IfScore::new(1, 1, 1)),
                None,
                Some(IfScore::new(4, 4, 4)),
                Some(IfScore::new(2, 2, 2)),
            ]
        );
    }

    #[test]
    fn short_batch_answer_rejects_the_batch() {
        let validator = BatchOnly {
            drop_last: true,
            ..BatchOnly::default()
        };
        let submissions = vec![
            submission().with_content("1/1/1"),
            submission().with_content("2/2/2"),
        ];

        let err = validate_submissions::<Infinifactory, _>(&validator, submissions).unwrap_err();
        assert_eq!(err.message, "validator returned 1 results for 2 solutions");
    }
}
