use crate::types::RpslObject;

/// The NRTM wire parser is an external collaborator (§1, §6): it is not
/// part of this system, only its output contract is. That contract is a
/// lazy, possibly infinite sequence of `(command, serial, object)` items,
/// which we model directly as a channel the parser feeds and a `DbWorker`
/// drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NrtmCommand {
    Add,
    Del,
    /// Serial overrun: the mirror's requested serial is no longer
    /// retained and a full resync is required.
    Reset,
}

#[derive(Debug, Clone)]
pub struct NrtmEvent {
    pub command: NrtmCommand,
    pub serial: u64,
    /// `None` for `Reset`, and for malformed items the parser chose to
    /// surface rather than silently drop.
    pub object: Option<RpslObject>,
}

impl NrtmEvent {
    pub fn reset(serial: u64) -> Self {
        NrtmEvent {
            command: NrtmCommand::Reset,
            serial,
            object: None,
        }
    }

    pub fn add(serial: u64, object: RpslObject) -> Self {
        NrtmEvent {
            command: NrtmCommand::Add,
            serial,
            object: Some(object),
        }
    }

    pub fn del(serial: u64, object: RpslObject) -> Self {
        NrtmEvent {
            command: NrtmCommand::Del,
            serial,
            object: Some(object),
        }
    }
}

/// The channel flavour an NRTM source feeds. A `DbWorker` owns the
/// receiving half; whatever produces events (a real NRTM client, a replay
/// file, a test double) owns the sending half.
pub type NrtmReceiver = tokio::sync::mpsc::Receiver<NrtmEvent>;
pub type NrtmSender = tokio::sync::mpsc::Sender<NrtmEvent>;
