//! Batch commands
//!
//! A [`Batch`] is the unit of atomicity: the primary-record write for a
//! logical operation and all of its index mutations travel in one batch,
//! so any observer reading through the same store sees either all of
//! them or none.

/// One mutation inside an atomic batch
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set a record key to a byte payload
    Put {
        /// Record key
        key: String,
        /// Serialized record
        value: Vec<u8>,
    },
    /// Delete a key from every keyspace
    Delete {
        /// Key to remove
        key: String,
    },
    /// Add a member to a set
    SetAdd {
        /// Set key
        key: String,
        /// Member to add
        member: String,
    },
    /// Remove a member from a set
    SetRemove {
        /// Set key
        key: String,
        /// Member to remove
        member: String,
    },
    /// Add a scored member to a sorted set (overwrites the score)
    SortedAdd {
        /// Sorted-set key
        key: String,
        /// Member score
        score: f64,
        /// Member to add
        member: String,
    },
    /// Remove a member from a sorted set
    SortedRemove {
        /// Sorted-set key
        key: String,
        /// Member to remove
        member: String,
    },
}

/// Per-command execution result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Command applied, nothing to report
    Done,
    /// Number of keys or members the command actually affected
    Count(u64),
}

impl Reply {
    /// The affected count, treating `Done` as zero
    pub fn count(self) -> u64 {
        match self {
            Reply::Done => 0,
            Reply::Count(n) => n,
        }
    }
}

/// An ordered list of commands executed atomically
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    commands: Vec<Command>,
}

impl Batch {
    /// Create an empty batch
    pub fn new() -> Self {
        Batch::default()
    }

    /// Append one command
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Append a list of commands
    pub fn extend(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.commands.extend(commands);
    }

    /// Number of commands in the batch
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the batch carries no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The commands, in execution order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

impl FromIterator<Command> for Batch {
    fn from_iter<T: IntoIterator<Item = Command>>(iter: T) -> Self {
        Batch {
            commands: iter.into_iter().collect(),
        }
    }
}
