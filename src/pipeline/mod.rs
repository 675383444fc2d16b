//! Pipeline components: queues, completion barrier, reader and hasher pools, orchestrator.

pub mod completion;
pub mod context;
pub mod hasher;
pub mod orchestrator;
pub mod reader;
pub mod sink;
pub mod source;

pub use completion::{CompletionBarrier, PendingToken};
pub use context::{
    ItemToHash, PendingFile, PipelineChannels, PipelineHandles, RunTally, WorkerContext,
    create_pipeline_channels,
};
pub use hasher::{hash_item, spawn_hasher_workers};
pub use orchestrator::{feed_filenames, run_pipeline, shutdown_pipeline_handles, start_pipeline};
pub use reader::{read_file, spawn_reader_workers};
pub use sink::{CollectingSink, ResultSink, WriterSink};
pub use source::{DelimitedNames, FilenameSource};
