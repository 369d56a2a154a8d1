use std::collections::HashMap;

use mockall::mock;
use xsdvalidate::EnvProvider;

mock! {
    /// Environment provider whose lookups are set per test
    pub Env {}

    impl EnvProvider for Env {
        fn get(&self, key: &str) -> Option<String>;
    }
}

/// Mock environment answering from `vars` and `None` for everything else
pub fn mock_env(vars: &[(&str, &str)]) -> MockEnv {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    let mut env = MockEnv::new();
    env.expect_get()
        .returning(move |key| vars.get(key).cloned());
    env
}
