mod helpers;

mod cli_tests;
mod http_collector_tests;
mod pipeline_tests;
