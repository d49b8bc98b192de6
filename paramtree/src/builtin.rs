//! Built-in kinds.
//!
//! These are the well-known modules of the default simulation configuration
//! and the parameter sets they nest. Four of the set kinds carry a
//! distinguished identity parameter (activity type, mode, strategy name,
//! subpopulation).

use crate::catalogue::{ChildDecl, KindDecl, ParamDecl, ParamType};

pub const GLOBAL: &str = "global";
pub const CONTROLLER: &str = "controller";
pub const SCORING: &str = "scoring";
pub const SCORING_PARAMETERS: &str = "scoringParameters";
pub const ACTIVITY_PARAMS: &str = "activityParams";
pub const MODE_PARAMS: &str = "modeParams";
pub const REPLANNING: &str = "replanning";
pub const STRATEGY_SETTINGS: &str = "strategySettings";
pub const ROUTING: &str = "routing";
pub const TELEPORTED_MODE_PARAMS: &str = "teleportedModeParameters";

const DEFAULT_MODES: [&str; 4] = ["car", "pt", "walk", "bike"];
const SEED_ACTIVITIES: [&str; 5] = ["home", "work", "education", "shop", "other"];

fn int() -> ParamType {
    ParamType::Int {
        min: None,
        max: None,
    }
}

fn non_negative() -> ParamType {
    ParamType::Int {
        min: Some(0),
        max: None,
    }
}

/// All built-in kind declarations.
pub fn kinds() -> Vec<KindDecl> {
    vec![
        KindDecl::module(GLOBAL)
            .strict()
            .param(
                ParamDecl::new("randomSeed", int())
                    .default_value("4711")
                    .comment("Seed of the random number generator used by every module."),
            )
            .param(
                ParamDecl::new("numberOfThreads", non_negative())
                    .default_value("2")
                    .comment("Number of threads for parallel modules; 0 lets each module decide."),
            )
            .param(
                ParamDecl::new("coordinateSystem", ParamType::String)
                    .default_value("Atlantis")
                    .comment("Coordinate reference system of all input files."),
            ),
        KindDecl::module(CONTROLLER)
            .strict()
            .param(
                ParamDecl::new("firstIteration", non_negative())
                    .default_value("0")
                    .comment("Iteration the run starts with."),
            )
            .param(
                ParamDecl::new("lastIteration", non_negative())
                    .default_value("1000")
                    .comment("Iteration the run stops after."),
            )
            .param(
                ParamDecl::new("outputDirectory", ParamType::String)
                    .default_value("./output")
                    .comment("Directory all output files are written to."),
            )
            .param(
                ParamDecl::new(
                    "overwriteFiles",
                    ParamType::Enum {
                        values: vec![
                            "failIfDirectoryExists".into(),
                            "overwriteExistingFiles".into(),
                            "deleteDirectoryIfExists".into(),
                        ],
                    },
                )
                .default_value("failIfDirectoryExists")
                .comment("What to do when the output directory already exists."),
            ),
        KindDecl::module(SCORING)
            .strict()
            .param(
                ParamDecl::new("brainExpBeta", ParamType::Float)
                    .default_value("1.0")
                    .comment("Logit scale parameter for plan selection."),
            )
            .param(
                ParamDecl::new("learningRate", ParamType::Float)
                    .default_value("1.0")
                    .comment("Weight of the new score when updating plan scores."),
            )
            .child(ChildDecl::new(SCORING_PARAMETERS).with_defaults(["default"])),
        KindDecl::set(SCORING_PARAMETERS)
            .identity("subpopulation")
            .param(ParamDecl::new("subpopulation", ParamType::String))
            .param(ParamDecl::new("performing", ParamType::Float).default_value("6.0"))
            .param(ParamDecl::new("lateArrival", ParamType::Float).default_value("-18.0"))
            .child(ChildDecl::new(ACTIVITY_PARAMS))
            .child(ChildDecl::new(MODE_PARAMS).with_defaults(DEFAULT_MODES))
            .seed(ACTIVITY_PARAMS, SEED_ACTIVITIES)
            .seed(MODE_PARAMS, DEFAULT_MODES),
        KindDecl::set(ACTIVITY_PARAMS)
            .identity("activityType")
            .param(ParamDecl::new("activityType", ParamType::String))
            .param(ParamDecl::new("typicalDuration", ParamType::String).default_value("undefined"))
            .param(ParamDecl::new("priority", ParamType::Float).default_value("1.0")),
        KindDecl::set(MODE_PARAMS)
            .identity("mode")
            .param(ParamDecl::new("mode", ParamType::String))
            .param(
                ParamDecl::new("marginalUtilityOfTraveling_util_hr", ParamType::Float)
                    .default_value("-6.0"),
            )
            .param(ParamDecl::new("constant", ParamType::Float).default_value("0.0")),
        KindDecl::module(REPLANNING)
            .strict()
            .param(
                ParamDecl::new("maxAgentPlanMemorySize", non_negative())
                    .default_value("5")
                    .comment("Maximum number of plans per agent; 0 keeps all plans."),
            )
            .child(ChildDecl::new(STRATEGY_SETTINGS).with_defaults(["ReRoute"])),
        KindDecl::set(STRATEGY_SETTINGS)
            .identity("strategyName")
            .param(ParamDecl::new("strategyName", ParamType::String))
            .param(ParamDecl::new("weight", ParamType::Float).default_value("0.1"))
            .param(
                ParamDecl::new("disableAfterIteration", int()).default_value("-1"),
            ),
        KindDecl::module(ROUTING)
            .strict()
            .param(
                ParamDecl::new("networkModes", ParamType::String)
                    .default_value("car")
                    .comment("Comma-separated modes routed on the network."),
            )
            .child(ChildDecl::new(TELEPORTED_MODE_PARAMS).with_defaults(["walk", "bike"])),
        KindDecl::set(TELEPORTED_MODE_PARAMS)
            .identity("mode")
            .param(ParamDecl::new("mode", ParamType::String))
            .param(ParamDecl::new("teleportedModeSpeed", ParamType::Float).default_value("0.833"))
            .param(ParamDecl::new("beelineDistanceFactor", ParamType::Float).default_value("1.3")),
    ]
}
