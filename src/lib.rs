//! # Sudoku Carousel
//!
//! A daily Sudoku publisher. Each run produces one puzzle and its solution as
//! a pair of JPEGs, hosts them on a public image service and posts them as a
//! two-image Instagram carousel. The solution is drawn upside down with noise
//! so a glance at the second slide does not spoil the puzzle.
//!
//! # Architecture: One Cycle
//!
//! ```text
//! 1. Generate  shape + difficulty  →  Puzzle           (board + unique solution)
//! 2. Render    Puzzle              →  two JPEGs        (puzzle, obfuscated solution)
//! 3. Host      JPEG bytes          →  public URLs      (imgbb or freeimage.host)
//! 4. Publish   URLs                →  carousel media   (Graph API containers)
//! 5. Verify    access token        →  fresh / rotated  (versioned secret store)
//! ```
//!
//! Steps are tracked by the stage machine in [`publish`]. A failure in steps
//! 3-4 ends the cycle in `Failed`, but step 5 runs regardless so an expiring
//! token never outlives a bad day.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`puzzle`] | Board model, backtracking solver, generator with uniqueness check |
//! | [`imaging`] | Grid rendering, solution obfuscation, JPEG encoding |
//! | [`studio`] | Generate + render a pair and write it to the output directory |
//! | [`http`] | Blocking HTTP seam (`Transport`) over `reqwest` |
//! | [`graph`] | Graph API calls: media, comments, containers, token exchange |
//! | [`hosting`] | Image hosting providers with retry |
//! | [`engagement`] | Reply to recent comments before posting |
//! | [`credentials`] | Credential bundle, versioned secret store, token refresh |
//! | [`publish`] | The full cycle and its stage machine |
//! | [`serve`] | Latest-image lookup for the `fetch` command |
//! | [`retry`] | Retry policy with backoff, best-effort steps |
//! | [`config`] | Layered `config.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Injectable I/O
//!
//! Every network call goes through [`http::Transport`], every pause through
//! [`retry::Sleeper`] and every secret through [`credentials::SecretBackend`].
//! The whole cycle runs in tests against recording mocks with no sockets and
//! no real sleeping.
//!
//! ## One Live Credential Version
//!
//! The secret store is append-only with soft destruction. After a token
//! rotation the new version is added first and all older enabled versions are
//! destroyed, so a crash between the two leaves two valid versions rather than
//! none.

pub mod config;
pub mod credentials;
pub mod engagement;
pub mod graph;
pub mod hosting;
pub mod http;
pub mod imaging;
pub mod output;
pub mod publish;
pub mod puzzle;
pub mod retry;
pub mod serve;
pub mod studio;

#[cfg(test)]
pub(crate) mod test_helpers;
