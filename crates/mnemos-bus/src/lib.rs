// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent-to-agent messaging for Mnemos.
//!
//! Each agent owns one [`Mailbox`]. A sender composes a message with its own
//! mailbox and the [`PostOffice`] delivers it into the receiver's mailbox.
//! Receivers consume their queue destructively with `drain`.

pub mod mailbox;
pub mod post_office;

pub use mailbox::Mailbox;
pub use post_office::PostOffice;
