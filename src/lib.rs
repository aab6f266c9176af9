//! Qt TS Updater - fetch translation templates and merge them into TS files

pub mod engine;
