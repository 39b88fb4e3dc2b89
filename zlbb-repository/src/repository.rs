//! Submission pipeline of one game.
//!
//! [`SolutionRepository`] coordinates commands (submissions, which run the
//! frontier engine inside an archive write session) and queries (which read
//! lock-free snapshots).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};
use zlbb_archive::marshal::{read_frontier, solution_path, write_frontier};
use zlbb_archive::{ArchiveStore, WriteSession};
use zlbb_core::{
    ArchiveRules, Category, CategoryRecord, DefaultDuplicatePolicy, DuplicatePolicy, Frontier,
    Game, Insertion, Puzzle, Record, Solution, StringFormat, Submission, format_score,
};

use crate::error::{RepositoryError, Result};
use crate::leaderboard::LeaderboardPublisher;
use crate::validation::{
    ValidationError, ValidationResult, Validator, validate_submission, validate_submissions,
};

/// Outcome of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult<S> {
    /// The solution entered the frontier, or upgraded an entry with the
    /// same score.
    Accepted {
        record: Record<S>,
        /// Categories the solution holds after the change.
        categories: BTreeSet<&'static str>,
        /// Entries the solution dominated and removed.
        evicted: Vec<Record<S>>,
    },
    /// The score is already in the frontier and the submission adds nothing.
    Duplicate { existing: Record<S> },
    /// Frontier entries that dominate the submission.
    Dominated { by: Vec<Record<S>> },
    /// Validation rejected the submission; the archive was not touched.
    Failure { message: String },
}

impl<S> SubmitResult<S> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitResult::Accepted { .. })
    }
}

/// The archive of every puzzle of game `G`, kept in store `St`.
pub struct SolutionRepository<G: Game, St, P = DefaultDuplicatePolicy> {
    store: St,
    validator: Arc<dyn Validator<G>>,
    policy: P,
    publisher: Option<LeaderboardPublisher<G>>,
}

impl<G: Game, St: ArchiveStore> SolutionRepository<G, St> {
    pub fn new(store: St, validator: Arc<dyn Validator<G>>) -> Self {
        Self {
            store,
            validator,
            policy: DefaultDuplicatePolicy,
            publisher: None,
        }
    }
}

impl<G, St, P> SolutionRepository<G, St, P>
where
    G: Game,
    St: ArchiveStore,
    P: DuplicatePolicy<G::Score>,
{
    /// Replaces the rule applied to resubmissions of a known score.
    pub fn with_policy<Q: DuplicatePolicy<G::Score>>(
        self,
        policy: Q,
    ) -> SolutionRepository<G, St, Q> {
        SolutionRepository {
            store: self.store,
            validator: self.validator,
            policy,
            publisher: self.publisher,
        }
    }

    /// Re-renders the wiki leaderboard after every accepted submission.
    #[must_use]
    pub fn with_publisher(mut self, publisher: LeaderboardPublisher<G>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    fn rules<'a>(
        &'a self,
        categories: &'a [&'static Category<G::Score>],
    ) -> ArchiveRules<'a, G::Score> {
        ArchiveRules::new(G::metrics(), categories, &self.policy)
    }

    fn show(score: &G::Score) -> String {
        format_score(score, G::metrics(), StringFormat::Plain, None)
    }

    fn record(&self, puzzle: &Puzzle, solution: &Solution<G::Score>) -> Record<G::Score> {
        let path = solution_path::<G>(puzzle, &solution.score);
        solution.to_record(puzzle, Some(self.store.raw_link(&path)), Some(path))
    }

    // === Commands ===

    /// Validates and submits one solution.
    ///
    /// Validation runs before the write session is acquired. The leaderboard
    /// is republished once the change has been pushed.
    #[instrument(
        name = "repository::submit",
        skip_all,
        fields(puzzle = %submission.puzzle, author = %submission.author)
    )]
    pub fn submit(&self, submission: Submission<G::Score>) -> Result<SubmitResult<G::Score>> {
        let (puzzle, candidate) =
            match validate_submission::<G, _>(self.validator.as_ref(), submission) {
                ValidationResult::Valid { puzzle, solution } => (puzzle, solution),
                ValidationResult::Invalid { message, .. } => {
                    debug!(%message, "submission failed validation");
                    return Ok(SubmitResult::Failure { message });
                }
            };

        let mut staged = None;
        let result = {
            let mut session = self.write_access()?;
            let result = self.submit_one(&mut session, puzzle, candidate, |_, _, frontier| {
                staged = Some(frontier.clone());
            })?;
            self.push(&mut session)?;
            result
        };

        if let Some(frontier) = staged {
            self.publish(puzzle, &frontier);
        }
        Ok(result)
    }

    /// Runs the frontier engine for one validated candidate inside `session`.
    ///
    /// The frontier is read from the session, so earlier submissions of the
    /// same session are observed. An accepted change is committed as one
    /// commit and `on_success` receives the stored solution and the new
    /// frontier. Nothing is pushed.
    ///
    /// # Errors
    ///
    /// On a persistence failure the session is rolled back, discarding every
    /// unpushed commit, and the error is returned.
    pub fn submit_one<W: WriteSession>(
        &self,
        session: &mut W,
        puzzle: &'static Puzzle,
        candidate: Solution<G::Score>,
        on_success: impl FnOnce(&'static Puzzle, &Solution<G::Score>, &Frontier<G::Score>),
    ) -> Result<SubmitResult<G::Score>> {
        let categories = G::supported_categories(puzzle);
        let rules = self.rules(&categories);

        let current = match read_frontier::<G>(&*session, puzzle, &rules) {
            Ok(current) => current,
            Err(e) => return Err(abort(session, puzzle, e)),
        };

        let (next, accepted, evicted) = match current.insert(candidate, &rules) {
            Insertion::Duplicate { existing } => {
                debug!(puzzle = %puzzle.id, score = %Self::show(&existing.score), "duplicate");
                return Ok(SubmitResult::Duplicate {
                    existing: self.record(puzzle, &existing),
                });
            }
            Insertion::Dominated { by } => {
                debug!(puzzle = %puzzle.id, dominated_by = by.len(), "dominated");
                return Ok(SubmitResult::Dominated {
                    by: by.iter().map(|s| self.record(puzzle, s)).collect(),
                });
            }
            Insertion::Accepted {
                frontier,
                accepted,
                evicted,
            } => (frontier, accepted, evicted),
            Insertion::Upgraded {
                frontier, accepted, ..
            } => (frontier, accepted, Vec::new()),
        };

        let score = Self::show(&accepted.score);
        let message = format!("{} {score} by {}", puzzle.id, accepted.author);
        if let Err(e) = write_frontier::<G>(session, puzzle, &current, &next)
            .and_then(|()| session.commit(&message))
        {
            return Err(abort(session, puzzle, e));
        }

        info!(
            puzzle = %puzzle.id,
            %score,
            author = %accepted.author,
            categories = ?accepted.categories,
            evicted = evicted.len(),
            "solution accepted"
        );
        on_success(puzzle, &accepted, &next);

        Ok(SubmitResult::Accepted {
            record: self.record(puzzle, &accepted),
            categories: accepted.categories.clone(),
            evicted: evicted.iter().map(|s| self.record(puzzle, s)).collect(),
        })
    }

    /// Submits already validated items in input order under one write
    /// session, pushing once at the end.
    ///
    /// Invalid items become [`SubmitResult::Failure`] without touching the
    /// archive. Later items observe the effects of earlier ones.
    ///
    /// # Errors
    ///
    /// A persistence failure discards the whole batch.
    #[instrument(name = "repository::submit_all", skip_all, fields(items = items.len()))]
    pub fn submit_all(
        &self,
        items: Vec<ValidationResult<G::Score>>,
    ) -> Result<Vec<SubmitResult<G::Score>>> {
        let mut staged: BTreeMap<&'static str, (&'static Puzzle, Frontier<G::Score>)> =
            BTreeMap::new();
        let mut results = Vec::with_capacity(items.len());
        {
            let mut session = self.write_access()?;
            for item in items {
                let result = match item {
                    ValidationResult::Invalid { message, .. } => SubmitResult::Failure { message },
                    ValidationResult::Valid { puzzle, solution } => {
                        self.submit_one(&mut session, puzzle, solution, |p, _, frontier| {
                            staged.insert(p.id, (p, frontier.clone()));
                        })?
                    }
                };
                results.push(result);
            }
            self.push(&mut session)?;
        }

        for (puzzle, frontier) in staged.values() {
            self.publish(puzzle, frontier);
        }
        Ok(results)
    }

    /// Validates a batch of raw submissions and submits it.
    ///
    /// # Errors
    ///
    /// Batches larger than [`crate::MAX_BATCH_SIZE`] are rejected before the
    /// archive is touched.
    pub fn submit_batch(
        &self,
        submissions: Vec<Submission<G::Score>>,
    ) -> Result<Vec<SubmitResult<G::Score>>> {
        let items = validate_submissions::<G, _>(self.validator.as_ref(), submissions)
            .map_err(|e: ValidationError| {
                debug!(error = %e, "batch rejected");
                RepositoryError::BatchRejected(e)
            })?;
        self.submit_all(items)
    }

    /// Re-renders and republishes the leaderboard block of `puzzle`.
    ///
    /// Returns whether the page changed; `false` as well when no publisher
    /// is configured.
    pub fn rebuild_leaderboard(&self, puzzle: &Puzzle) -> Result<bool> {
        let Some(publisher) = &self.publisher else {
            return Ok(false);
        };
        let frontier = self.frontier(puzzle)?;
        let holders = self.holder_records(puzzle, &frontier);
        let message = format!("rebuild {} leaderboard", puzzle.id);
        Ok(publisher.publish(puzzle, &holders, &message)?)
    }

    fn write_access(&self) -> Result<St::Session<'_>> {
        self.store.write_access().map_err(|e| {
            error!(error = %e, "failed to acquire archive write access");
            e.into()
        })
    }

    /// Pushes the session. A failed push discards the local commits instead
    /// of leaving them for the release to retry.
    fn push(&self, session: &mut impl WriteSession) -> Result<()> {
        if let Err(e) = session.push() {
            error!(error = %e, "failed to push archive, discarding local commits");
            if let Err(rollback) = session.rollback() {
                error!(error = %rollback, "rollback after failed push failed");
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Best-effort leaderboard update after a change.
    fn publish(&self, puzzle: &Puzzle, frontier: &Frontier<G::Score>) {
        let Some(publisher) = &self.publisher else {
            return;
        };
        let holders = self.holder_records(puzzle, frontier);
        let message = format!("update {} leaderboard", puzzle.id);
        if let Err(e) = publisher.publish(puzzle, &holders, &message) {
            warn!(puzzle = %puzzle.id, error = %e, "failed to publish leaderboard");
        }
    }

    fn holder_records(
        &self,
        puzzle: &Puzzle,
        frontier: &Frontier<G::Score>,
    ) -> BTreeMap<&'static str, Record<G::Score>> {
        let mut holders = BTreeMap::new();
        for solution in frontier.category_holders() {
            let record = self.record(puzzle, solution);
            for category in &solution.categories {
                holders.insert(*category, record.clone());
            }
        }
        holders
    }

    // === Queries ===

    /// The committed frontier of `puzzle`. May trail an in-flight session.
    pub fn frontier(&self, puzzle: &Puzzle) -> Result<Frontier<G::Score>> {
        let categories = G::supported_categories(puzzle);
        let snapshot = self.store.snapshot()?;
        Ok(read_frontier::<G>(&snapshot, puzzle, &self.rules(&categories))?)
    }

    /// Frontier entries holding at least one category, or every entry when
    /// `include_frontier` is set, in canonical order.
    pub fn find_category_holders(
        &self,
        puzzle: &Puzzle,
        include_frontier: bool,
    ) -> Result<Vec<CategoryRecord<G::Score>>> {
        let frontier = self.frontier(puzzle)?;
        Ok(frontier
            .solutions()
            .iter()
            .filter(|s| include_frontier || !s.categories.is_empty())
            .map(|s| CategoryRecord {
                record: self.record(puzzle, s),
                categories: s.categories.clone(),
            })
            .collect())
    }

    /// The holder of the category named `category` on `puzzle`, if any.
    pub fn find_best(&self, puzzle: &Puzzle, category: &str) -> Result<Option<Record<G::Score>>> {
        let category = G::find_category(category)?;
        let frontier = self.frontier(puzzle)?;
        Ok(frontier.holder(category.id).map(|s| self.record(puzzle, s)))
    }
}

/// Logs a persistence failure and discards the session's unpushed state.
fn abort(
    session: &mut impl WriteSession,
    puzzle: &Puzzle,
    error: zlbb_archive::Error,
) -> RepositoryError {
    error!(puzzle = %puzzle.id, error = %error, "failed to persist frontier, rolling back");
    if let Err(rollback) = session.rollback() {
        error!(error = %rollback, "rollback failed");
    }
    error.into()
}
