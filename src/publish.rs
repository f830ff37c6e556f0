//! The publish cycle as an explicit state machine.
//!
//! ```text
//! Idle → Generated → Rendered → Hosted → ContainersCreated
//!      → CarouselCreated → Published → CredentialsVerified → Done
//! ```
//!
//! Any non-terminal stage may drop to `Failed`. Generation, rendering and
//! credential loading abort the run ([`RunError`]); everything after that
//! degrades instead. Engagement is best-effort, a remote step failure ends
//! the publish sequence, and credential verification runs in every case
//! without changing the outcome.

use crate::credentials::{
    CredentialBundle, CredentialError, CredentialField, CredentialStore, MissingCredential,
    StoreError, TokenRefresher, VerifyOutcome,
};
use crate::engagement::{EngagementSummary, SocialEngagement};
use crate::graph::{GraphClient, GraphError};
use crate::hosting::ImageHost;
use crate::imaging::ImagingError;
use crate::puzzle::{Board, GenerationError, Puzzle, PuzzleLibrary, PuzzleSpec};
use crate::retry::best_effort;
use crate::studio::{RenderedPair, Studio};
use chrono::NaiveDate;
use rand::Rng;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub const HASHTAGS: &str = "\
#sudoku #sudokutime #sudokupuzzles #puzzle #puzzles #sudokuaddict #math
#kidsactivities #onlineclasses #brainteasers #funactivities #trainyourbrain
#maths #rubikscube #kidsactivity #education #puzzleaddict #activitiesforkids
#mathematics #challengeyourself #crossword #onlinepuzzles #numberpuzzles
#online #brainpuzzles #numberlandpuzzles #secondaryteacher #rjsclasses
#sudokoclass #onlinecoaching";

/// Run-fatal failures.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Puzzle generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("Rendering failed: {0}")]
    Imaging(#[from] ImagingError),
    #[error("Could not load credentials: {0}")]
    Credentials(#[from] StoreError),
}

/// Why the remote publish sequence stopped.
#[derive(Error, Debug)]
pub enum PublishStepError {
    #[error("Only {hosted} of {expected} images were hosted")]
    Hosting { hosted: usize, expected: usize },
    #[error(transparent)]
    Credentials(#[from] MissingCredential),
    #[error("Only {created} of {expected} media containers were created")]
    Container { created: usize, expected: usize },
    #[error("Carousel container failed: {0}")]
    Carousel(#[source] GraphError),
    #[error("Publishing failed: {0}")]
    Publish(#[source] GraphError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Generated,
    Rendered,
    Hosted,
    ContainersCreated,
    CarouselCreated,
    Published,
    CredentialsVerified,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;
        match (self, next) {
            (Idle, Generated)
            | (Generated, Rendered)
            | (Rendered, Hosted)
            | (Hosted, ContainersCreated)
            | (ContainersCreated, CarouselCreated)
            | (CarouselCreated, Published)
            | (Published, CredentialsVerified)
            | (CredentialsVerified, Done) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Generated => "generated",
            Self::Rendered => "rendered",
            Self::Hosted => "hosted",
            Self::ContainersCreated => "containers created",
            Self::CarouselCreated => "carousel created",
            Self::Published => "published",
            Self::CredentialsVerified => "credentials verified",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Ordered record of visited stages.
#[derive(Debug, Clone)]
struct Machine {
    trail: Vec<Stage>,
}

impl Machine {
    fn new() -> Self {
        Self {
            trail: vec![Stage::Idle],
        }
    }

    fn stage(&self) -> Stage {
        self.trail.last().copied().unwrap_or(Stage::Idle)
    }

    fn advance(&mut self, next: Stage) {
        let from = self.stage();
        debug_assert!(from.can_advance_to(next), "illegal transition {from} -> {next}");
        tracing::info!(%from, to = %next, "stage");
        self.trail.push(next);
    }
}

/// Per-run data. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct PublishState {
    pub puzzle: Option<Puzzle>,
    pub caption: String,
    pub image_urls: Vec<String>,
    pub creation_ids: Vec<String>,
    pub carousel_creation_id: Option<String>,
    pub media_id: Option<String>,
}

/// Post text for a puzzle published on `date`.
pub fn caption(spec: &PuzzleSpec, board: &Board, date: NaiveDate) -> String {
    let difficulty = (spec.difficulty * 100.0) as u32;
    format!(
        "Enjoy today's ({})\n\
         Sudoku with cells {}x{} of difficulty {}/100,\n\
         which has {}/{} numbers.\n\
         .\n.\n.\n\
         {}\n",
        date.format("%d %B %Y"),
        spec.height,
        spec.width,
        difficulty,
        board.filled_count(),
        board.cell_count(),
        HASHTAGS,
    )
}

/// Everything a run did, for the status line and the logs.
#[derive(Debug)]
pub struct RunReport {
    pub trail: Vec<Stage>,
    pub state: PublishState,
    pub failure: Option<PublishStepError>,
    pub engagement: Option<EngagementSummary>,
    pub credentials: Result<VerifyOutcome, CredentialError>,
    pub paths: Vec<PathBuf>,
}

impl RunReport {
    pub fn published(&self) -> bool {
        self.trail.contains(&Stage::Published)
    }

    pub fn final_stage(&self) -> Stage {
        self.trail.last().copied().unwrap_or(Stage::Idle)
    }

    pub fn status_line(&self) -> &'static str {
        if self.published() {
            "Data Uploaded"
        } else {
            "Publish failed"
        }
    }
}

pub struct Publisher<'a, L> {
    pub studio: Studio<L>,
    pub store: CredentialStore<'a>,
    pub host: Box<dyn ImageHost + 'a>,
    pub graph: GraphClient<'a>,
    /// `None` skips engagement.
    pub engagement: Option<SocialEngagement<'a>>,
    pub refresher: TokenRefresher<'a>,
}

impl<L: PuzzleLibrary> Publisher<'_, L> {
    /// One full cycle with a freshly sampled puzzle.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RunReport, RunError> {
        let spec = self.studio.sample_spec(rng);
        self.run_spec(&spec, chrono::Local::now().date_naive(), rng)
    }

    pub fn run_spec<R: Rng + ?Sized>(
        &self,
        spec: &PuzzleSpec,
        date: NaiveDate,
        rng: &mut R,
    ) -> Result<RunReport, RunError> {
        let mut machine = Machine::new();
        let mut state = PublishState::default();

        let puzzle = self.studio.generate(spec, rng)?;
        state.caption = caption(spec, &puzzle.board, date);
        machine.advance(Stage::Generated);

        let pair = self.studio.render(&puzzle, rng)?;
        state.puzzle = Some(puzzle);
        machine.advance(Stage::Rendered);

        let bundle = self.store.load()?;

        let engagement = self.engagement.as_ref().and_then(|e| {
            best_effort("engagement", || e.engage_with(&bundle, rng))
        });

        let failure = self.publish(&mut machine, &mut state, &pair, &bundle).err();
        if let Some(e) = &failure {
            tracing::warn!(error = %e, "carousel not published");
            machine.advance(Stage::Failed);
        }

        let credentials = self.refresher.verify_and_rotate(&self.store, &bundle);
        if let Err(e) = &credentials {
            tracing::error!(error = %e, "credential verification failed");
        }
        if failure.is_none() {
            machine.advance(Stage::CredentialsVerified);
            machine.advance(Stage::Done);
        }

        Ok(RunReport {
            trail: machine.trail,
            state,
            failure,
            engagement,
            credentials,
            paths: vec![pair.puzzle_path, pair.solution_path],
        })
    }

    /// Hosting through publish. Stops at the first step that falls short.
    fn publish(
        &self,
        machine: &mut Machine,
        state: &mut PublishState,
        pair: &RenderedPair,
        bundle: &CredentialBundle,
    ) -> Result<(), PublishStepError> {
        let images = pair.images();
        for (kind, rendered) in images {
            match self.host.upload(rendered.image(), kind.file_name(), bundle) {
                Ok(url) => {
                    tracing::info!(host = self.host.name(), %url, "hosted image");
                    state.image_urls.push(url);
                }
                Err(e) => tracing::warn!(host = self.host.name(), error = %e, "hosting failed"),
            }
        }
        if state.image_urls.len() != images.len() {
            return Err(PublishStepError::Hosting {
                hosted: state.image_urls.len(),
                expected: images.len(),
            });
        }
        machine.advance(Stage::Hosted);

        let user_id = bundle.require(CredentialField::InstagramUserId)?;
        let token = bundle.require(CredentialField::AccessToken)?;

        for url in &state.image_urls {
            match self.graph.create_carousel_item(user_id, token, url) {
                Ok(id) => {
                    tracing::info!(creation_id = %id, "created media container");
                    state.creation_ids.push(id);
                }
                Err(e) => tracing::warn!(error = %e, "media container failed"),
            }
        }
        if state.creation_ids.len() != state.image_urls.len() {
            return Err(PublishStepError::Container {
                created: state.creation_ids.len(),
                expected: state.image_urls.len(),
            });
        }
        machine.advance(Stage::ContainersCreated);

        let carousel_id = self
            .graph
            .create_carousel(user_id, token, &state.creation_ids, &state.caption)
            .map_err(PublishStepError::Carousel)?;
        tracing::info!(creation_id = %carousel_id, "created carousel container");
        state.carousel_creation_id = Some(carousel_id.clone());
        machine.advance(Stage::CarouselCreated);

        let media_id = self
            .graph
            .publish(user_id, token, &carousel_id)
            .map_err(PublishStepError::Publish)?;
        tracing::info!(media_id = %media_id, "published carousel");
        state.media_id = Some(media_id);
        machine.advance(Stage::Published);
        Ok(())
    }
}
