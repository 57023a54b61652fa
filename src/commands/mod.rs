//! Typed model of user-defined commands
//!
//! The configuration tree is two levels deep: top-level entries are either
//! runnable leaves or folders of leaves. Leaves run a single command or a
//! sequence of steps, optionally repeated, delayed and gated by a `when`
//! clause. Workspace-scoped trees are merged into the global one under
//! namespaced keys, and the merged tree is flattened for the launcher and
//! filtered for the status bar and command palette.

pub mod command;
pub mod flatten;
pub mod folder;
pub mod status_bar;
pub mod workspace;
