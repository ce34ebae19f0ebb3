use anyhow::bail;
use figment::{
    providers::{Env, Format, Json, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util::logging::LevelFilter;

/// A struct which holds all configs.
#[derive(Debug, Clone)]
pub struct Configs {
    figment: Figment,
}

/// The main struct holding all the possible config options.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub general: General,
    pub output: Output,
}

/// The general config struct holding all the possible general options.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct General {
    pub log_level: Option<LevelFilter>,
}

/// How generated frames are printed.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Output {
    pub format: OutputFormat,
    pub h4: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line of hex bytes per frame.
    Hex,
    /// One JSON object per frame and line.
    Json,
    /// The raw frame bytes, back to back.
    Binary,
}

impl Configs {
    pub fn new(conf_dir: PathBuf) -> Configs {
        // Start off by merging in the default configuration file.
        let mut figments =
            Figment::new().merge(Toml::string(include_str!("default.toml")).nested());

        // Project files first, personal overrides last.
        let config_files = ["Em9301", ".em9301", "Em9301.local", ".em9301.local"];

        for file in &config_files {
            let toml_path = conf_dir.join(format!("{file}.toml"));
            let json_path = conf_dir.join(format!("{file}.json"));
            let yaml_path = conf_dir.join(format!("{file}.yaml"));
            let yml_path = conf_dir.join(format!("{file}.yml"));

            figments = figments
                .merge(Toml::file(toml_path).nested())
                .merge(Json::file(json_path).nested())
                .merge(Yaml::file(yaml_path).nested())
                .merge(Yaml::file(yml_path).nested());
        }

        // EM9301_OUTPUT__FORMAT=json overrides `output.format` in every profile.
        // EM9301_PROFILE selects the profile and is read by the command line parser.
        figments = figments.merge(
            Env::prefixed("EM9301_")
                .ignore(&["profile"])
                .split("__")
                .global(),
        );

        Configs { figment: figments }
    }

    pub fn merge(&mut self, conf_file: PathBuf) -> anyhow::Result<()> {
        let original = self.figment.clone();
        self.figment = match conf_file.extension().and_then(|e| e.to_str()) {
            Some("toml") => original.merge(Toml::file(conf_file).nested()),
            Some("json") => original.merge(Json::file(conf_file).nested()),
            Some("yml" | "yaml") => original.merge(Yaml::file(conf_file).nested()),
            _ => {
                bail!(
                    "File format not recognized from extension (supported: .toml, .json, .yaml / .yml)"
                )
            }
        };
        Ok(())
    }

    pub fn prof_names(&self) -> Vec<String> {
        self.figment
            .profiles()
            .map(|p| String::from(p.as_str().as_str()))
            .collect()
    }

    /// Extract the requested config, but only if the profile has been explicitly defined.
    ///
    /// Figment coerces unknown profiles into existence by inheriting from the default
    /// profile, which would silently ignore a typo in `--profile`.
    pub fn select_defined(self, name: &str) -> anyhow::Result<Config> {
        let defined_profiles = self.prof_names();
        let requested_profile_defined = defined_profiles
            .iter()
            .any(|p| p.eq_ignore_ascii_case(name));

        let config: Config = match self.figment.select(name).extract() {
            Ok(config) => config,
            Err(figerr) => bail!(
                "Failed to parse supplied configuration:\n{}",
                figerr
                    .into_iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<String>>()
                    .join("\n")
            ),
        };

        if !requested_profile_defined {
            bail!(
                "the requested configuration profile \"{}\" hasn't been defined (defined profiles: {})",
                name,
                defined_profiles.join(", ")
            );
        }

        Ok(config)
    }

    #[cfg(test)]
    fn with_data(mut self, toml: &str) -> Configs {
        self.figment = self.figment.merge(Toml::string(toml).nested());
        self
    }
}
