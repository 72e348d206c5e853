pub mod json_result_store;
