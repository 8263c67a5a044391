//! Observable events for aerofiles
//!
//! Every log line that marks a lifecycle step or a state change carries an
//! `event` field with one of these names, so logs can be filtered without
//! parsing messages.

use std::fmt;

/// Observable events in aerofiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Storage backend opened
    StorageOpened,
    /// Listener bound, serving requests
    Serving,
    /// Shutdown signal received
    ShutdownStart,

    // Object operations
    /// Object written by an upload
    ObjectUploaded,
    /// Folder placeholder written
    FolderCreated,
    /// Single object deleted
    ObjectDeleted,

    // Prefix deletion
    /// Recursive delete begins
    PrefixDeleteStart,
    /// One batch removed
    PrefixDeleteBatch,
    /// Recursive delete finished
    PrefixDeleteComplete,
    /// Recursive delete stopped early
    PrefixDeleteFailed,

    // Signed access
    /// Signed URL handed out
    SignedUrlIssued,
    /// Signed URL failed verification
    SignedUrlRejected,

    // Failures surfaced to clients
    /// Backend failure turned into a 5xx
    RequestFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            // Boot & Lifecycle
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StorageOpened => "STORAGE_OPENED",
            Event::Serving => "AEROFILES_SERVING",
            Event::ShutdownStart => "SHUTDOWN_START",

            // Objects
            Event::ObjectUploaded => "OBJECT_UPLOADED",
            Event::FolderCreated => "FOLDER_CREATED",
            Event::ObjectDeleted => "OBJECT_DELETED",

            // Prefix deletion
            Event::PrefixDeleteStart => "PREFIX_DELETE_BEGIN",
            Event::PrefixDeleteBatch => "PREFIX_DELETE_BATCH",
            Event::PrefixDeleteComplete => "PREFIX_DELETE_COMPLETE",
            Event::PrefixDeleteFailed => "PREFIX_DELETE_FAILED",

            // Signed access
            Event::SignedUrlIssued => "SIGNED_URL_ISSUED",
            Event::SignedUrlRejected => "SIGNED_URL_REJECTED",

            Event::RequestFailed => "REQUEST_FAILED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::PrefixDeleteBatch.as_str(), "PREFIX_DELETE_BATCH");
        assert_eq!(format!("{}", Event::Serving), "AEROFILES_SERVING");
    }
}
