pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Config {
        pub db_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_environment(config::Environment::default())
        }

        fn from_environment(environment: config::Environment) -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(environment)
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    fn default_port() -> u16 {
        8080
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn environment(vars: &[(&str, &str)]) -> config::Environment {
            let source = vars
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect();
            config::Environment::default().source(Some(source))
        }

        #[test]
        fn reads_database_url_and_port() {
            let config = Config::from_environment(environment(&[
                ("DB_URL", "postgres://localhost/todos"),
                ("PORT", "9090"),
            ]))
            .unwrap();

            assert_eq!(config.db_url, "postgres://localhost/todos");
            assert_eq!(config.port, 9090);
        }

        #[test]
        fn defaults_port_to_8080() {
            let config =
                Config::from_environment(environment(&[("DB_URL", "sqlite::memory:")])).unwrap();

            assert_eq!(config.port, 8080);
        }

        #[test]
        fn requires_database_url() {
            assert!(Config::from_environment(environment(&[("PORT", "9090")])).is_err());
        }
    }
}
pub mod entities;
pub mod todo;
pub mod web;
