// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presenting indicators and notifications.
//!
//! The engine never draws anything itself: it describes what should be shown through a
//! [`PresentationSink`]. The CLI renders documents to the terminal, and tests use a
//! [`RecordingSink`].

use crate::{document::DocumentId, results::OutcomeStatus};
use std::fmt;
use tracing::{error, info, warn};

/// The severity of a [`Notification`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum NotificationLevel {
    /// Informational.
    Info,
    /// Something the user probably wants to know about.
    Warn,
    /// Something went wrong, e.g. tests failed.
    Error,
}

/// A leveled, user-facing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// The severity.
    pub level: NotificationLevel,
    /// The message text.
    pub message: String,
}

impl Notification {
    /// Creates an informational notification.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    /// Creates a warning notification.
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warn,
            message: message.into(),
        }
    }

    /// Creates an error notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    /// Logs this notification through `tracing` at the matching level.
    pub fn log(&self) {
        match self.level {
            NotificationLevel::Info => info!("{}", self.message),
            NotificationLevel::Warn => warn!("{}", self.message),
            NotificationLevel::Error => error!("{}", self.message),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Receives presentation requests from the engine.
pub trait PresentationSink {
    /// Places a pass/fail marker on a line.
    fn place_marker(&mut self, document: &DocumentId, line: usize, status: OutcomeStatus);

    /// Attaches trailing text to a line.
    fn annotate(&mut self, document: &DocumentId, line: usize, text: &str);

    /// Removes every marker and annotation from a document.
    fn clear_markers(&mut self, document: &DocumentId);

    /// Shows a notification.
    fn notify(&mut self, notification: Notification);
}

impl<S: PresentationSink + ?Sized> PresentationSink for &mut S {
    fn place_marker(&mut self, document: &DocumentId, line: usize, status: OutcomeStatus) {
        (**self).place_marker(document, line, status)
    }

    fn annotate(&mut self, document: &DocumentId, line: usize, text: &str) {
        (**self).annotate(document, line, text)
    }

    fn clear_markers(&mut self, document: &DocumentId) {
        (**self).clear_markers(document)
    }

    fn notify(&mut self, notification: Notification) {
        (**self).notify(notification)
    }
}

/// A single request made to a [`RecordingSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkEvent {
    /// [`PresentationSink::place_marker`] was called.
    Marker {
        /// The document.
        document: DocumentId,
        /// The line.
        line: usize,
        /// The status shown.
        status: OutcomeStatus,
    },
    /// [`PresentationSink::annotate`] was called.
    Annotation {
        /// The document.
        document: DocumentId,
        /// The line.
        line: usize,
        /// The annotation text.
        text: String,
    },
    /// [`PresentationSink::clear_markers`] was called.
    Clear {
        /// The document.
        document: DocumentId,
    },
    /// [`PresentationSink::notify`] was called.
    Notify(Notification),
}

/// A sink that records every request, in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Vec<SinkEvent>,
}

impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded event.
    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    /// Returns the recorded notifications.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.events.iter().filter_map(|event| match event {
            SinkEvent::Notify(notification) => Some(notification),
            _ => None,
        })
    }

    /// Returns the markers currently shown for `document`: every marker placed since the last
    /// clear, in placement order.
    pub fn markers(&self, document: &DocumentId) -> Vec<(usize, OutcomeStatus)> {
        let mut markers = Vec::new();
        for event in &self.events {
            match event {
                SinkEvent::Clear { document: d } if d == document => markers.clear(),
                SinkEvent::Marker {
                    document: d,
                    line,
                    status,
                } if d == document => markers.push((*line, *status)),
                _ => {}
            }
        }
        markers
    }

    /// Discards every recorded event.
    pub fn reset(&mut self) {
        self.events.clear();
    }
}

impl PresentationSink for RecordingSink {
    fn place_marker(&mut self, document: &DocumentId, line: usize, status: OutcomeStatus) {
        self.events.push(SinkEvent::Marker {
            document: document.clone(),
            line,
            status,
        });
    }

    fn annotate(&mut self, document: &DocumentId, line: usize, text: &str) {
        self.events.push(SinkEvent::Annotation {
            document: document.clone(),
            line,
            text: text.to_owned(),
        });
    }

    fn clear_markers(&mut self, document: &DocumentId) {
        self.events.push(SinkEvent::Clear {
            document: document.clone(),
        });
    }

    fn notify(&mut self, notification: Notification) {
        self.events.push(SinkEvent::Notify(notification));
    }
}
