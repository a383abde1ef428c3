use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_list_limit_max")]
    pub list_limit_max: usize,
}

fn default_workers() -> usize {
    2
}

fn default_list_limit_max() -> usize {
    100
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            list_limit_max: default_list_limit_max(),
        }
    }
}
