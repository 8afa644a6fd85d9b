//! Environment variable registry.
//!
//! Every variable uses the `SENSORFLOW_` prefix with `__` separating nested
//! config paths (e.g., `SENSORFLOW_WIZARD__RESEND_COOLDOWN_SECS`). The `env`
//! command prints this table.

/// An environment variable definition
#[derive(Debug, Clone)]
pub struct EnvVar {
    pub name: &'static str,
    pub description: &'static str,
    pub category: EnvVarCategory,
    pub default: Option<&'static str>,
    pub example: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvVarCategory {
    Paths,
    Logging,
    Ui,
    Wizard,
    Backend,
    RestApi,
}

impl EnvVarCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            EnvVarCategory::Paths => "Paths",
            EnvVarCategory::Logging => "Logging",
            EnvVarCategory::Ui => "UI",
            EnvVarCategory::Wizard => "Wizards",
            EnvVarCategory::Backend => "Mock backend",
            EnvVarCategory::RestApi => "REST API",
        }
    }

    /// All categories in display order
    pub fn all() -> &'static [EnvVarCategory] {
        &[
            EnvVarCategory::Paths,
            EnvVarCategory::Logging,
            EnvVarCategory::Ui,
            EnvVarCategory::Wizard,
            EnvVarCategory::Backend,
            EnvVarCategory::RestApi,
        ]
    }
}

pub static ENV_VARS: &[EnvVar] = &[
    EnvVar {
        name: "SENSORFLOW_PATHS__STATE",
        description: "Directory for logs and saved configuration",
        category: EnvVarCategory::Paths,
        default: Some(".sensorflow"),
        example: Some("/var/lib/sensorflow"),
    },
    EnvVar {
        name: "SENSORFLOW_PATHS__FIXTURES",
        description: "JSON file replacing the built-in demo data",
        category: EnvVarCategory::Paths,
        default: None,
        example: Some("fixtures/demo.json"),
    },
    EnvVar {
        name: "SENSORFLOW_LOGGING__LEVEL",
        description: "Log level filter (trace, debug, info, warn, error)",
        category: EnvVarCategory::Logging,
        default: Some("info"),
        example: Some("debug"),
    },
    EnvVar {
        name: "SENSORFLOW_LOGGING__TO_FILE",
        description: "Write TUI logs to a file instead of stderr",
        category: EnvVarCategory::Logging,
        default: Some("true"),
        example: Some("false"),
    },
    EnvVar {
        name: "RUST_LOG",
        description: "Overrides the configured log filter",
        category: EnvVarCategory::Logging,
        default: None,
        example: Some("sensorflow=trace"),
    },
    EnvVar {
        name: "SENSORFLOW_UI__REFRESH_RATE_MS",
        description: "Milliseconds between TUI redraws",
        category: EnvVarCategory::Ui,
        default: Some("250"),
        example: Some("100"),
    },
    EnvVar {
        name: "SENSORFLOW_UI__PAGE_SIZE",
        description: "Rows per page in list views",
        category: EnvVarCategory::Ui,
        default: Some("10"),
        example: Some("20"),
    },
    EnvVar {
        name: "SENSORFLOW_UI__NOTICE_SECS",
        description: "Seconds a status-bar notice stays visible",
        category: EnvVarCategory::Ui,
        default: Some("4"),
        example: Some("8"),
    },
    EnvVar {
        name: "SENSORFLOW_WIZARD__RESEND_COOLDOWN_SECS",
        description: "Seconds before a verification code can be resent",
        category: EnvVarCategory::Wizard,
        default: Some("60"),
        example: Some("30"),
    },
    EnvVar {
        name: "SENSORFLOW_WIZARD__PASSWORD_MIN_LENGTH",
        description: "Minimum length of new passwords",
        category: EnvVarCategory::Wizard,
        default: Some("8"),
        example: Some("12"),
    },
    EnvVar {
        name: "SENSORFLOW_BACKEND__LATENCY_MS",
        description: "Simulated round-trip latency of the mock backend",
        category: EnvVarCategory::Backend,
        default: Some("400"),
        example: Some("0"),
    },
    EnvVar {
        name: "SENSORFLOW_BACKEND__RESET_CODE_TTL_SECS",
        description: "Lifetime of password reset codes",
        category: EnvVarCategory::Backend,
        default: Some("600"),
        example: Some("120"),
    },
    EnvVar {
        name: "SENSORFLOW_REST_API__ENABLED",
        description: "Start the REST API together with the TUI",
        category: EnvVarCategory::RestApi,
        default: Some("false"),
        example: Some("true"),
    },
    EnvVar {
        name: "SENSORFLOW_REST_API__PORT",
        description: "Port the REST API listens on",
        category: EnvVarCategory::RestApi,
        default: Some("7180"),
        example: Some("8080"),
    },
];

/// Get all environment variables for a given category
pub fn env_vars_for_category(category: EnvVarCategory) -> impl Iterator<Item = &'static EnvVar> {
    ENV_VARS.iter().filter(move |v| v.category == category)
}

/// Get environment variables grouped by category
pub fn env_vars_by_category() -> Vec<(EnvVarCategory, Vec<&'static EnvVar>)> {
    EnvVarCategory::all()
        .iter()
        .map(|cat| {
            let vars: Vec<&EnvVar> = env_vars_for_category(*cat).collect();
            (*cat, vars)
        })
        .filter(|(_, vars)| !vars.is_empty())
        .collect()
}
