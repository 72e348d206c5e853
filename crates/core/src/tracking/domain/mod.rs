pub mod accumulator;
pub mod frame_record;
pub mod result_store;
pub mod run_metadata;
pub mod statistics;
pub mod tracking_result;
