use {
    crate::{answer::Criterion, mv::MvAlgorithm, Error, Result},
    std::{fmt, path::PathBuf, str::FromStr},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Kawasaki,
    Maekawa,
    Cp,
    CpLinear,
    CpMvLsl,
    CpExMvLsl,
    CpLinearMv,
    CpDirect,
    CpCrimp,
    CpParallel,
    CpExLslParallel,
    MaekawaParallel,
}

/// How an algorithm runs the two stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plan {
    /// stage 1 only, every skeleton is a result
    Skeletons,
    /// complete patterns in one pass
    Direct,
    Assignments {
        search: MvAlgorithm,
        criterion: Criterion,
        parallel: bool,
    },
}

impl Algorithm {
    pub const ALL: [Algorithm; 12] = [
        Algorithm::Kawasaki,
        Algorithm::Maekawa,
        Algorithm::Cp,
        Algorithm::CpLinear,
        Algorithm::CpMvLsl,
        Algorithm::CpExMvLsl,
        Algorithm::CpLinearMv,
        Algorithm::CpDirect,
        Algorithm::CpCrimp,
        Algorithm::CpParallel,
        Algorithm::CpExLslParallel,
        Algorithm::MaekawaParallel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Kawasaki => "kawasaki",
            Algorithm::Maekawa => "maekawa",
            Algorithm::Cp => "cp",
            Algorithm::CpLinear => "cp_linear",
            Algorithm::CpMvLsl => "cp_MVLSL",
            Algorithm::CpExMvLsl => "cp_ExMVLSL",
            Algorithm::CpLinearMv => "cp_linearMV",
            Algorithm::CpDirect => "cp_direct",
            Algorithm::CpCrimp => "cp_crimp",
            Algorithm::CpParallel => "cp_parallel",
            Algorithm::CpExLslParallel => "cp_exLSLparallel",
            Algorithm::MaekawaParallel => "maekawa_parallel",
        }
    }

    pub fn plan(self) -> Plan {
        let assignments = |search, criterion, parallel| Plan::Assignments {
            search,
            criterion,
            parallel,
        };

        match self {
            Algorithm::Kawasaki => Plan::Skeletons,
            Algorithm::CpDirect => Plan::Direct,
            Algorithm::Maekawa => assignments(MvAlgorithm::Plain, Criterion::Maekawa, false),
            Algorithm::Cp => assignments(MvAlgorithm::Plain, Criterion::Foldable, false),
            Algorithm::CpLinear => {
                assignments(MvAlgorithm::Plain, Criterion::FoldableLinear, false)
            }
            Algorithm::CpMvLsl => assignments(MvAlgorithm::Lsl, Criterion::Foldable, false),
            Algorithm::CpExMvLsl => {
                assignments(MvAlgorithm::ExtendedLsl, Criterion::Foldable, false)
            }
            Algorithm::CpLinearMv => {
                assignments(MvAlgorithm::Memoized, Criterion::Foldable, false)
            }
            Algorithm::CpCrimp => {
                assignments(MvAlgorithm::CrimpSequence, Criterion::Foldable, false)
            }
            Algorithm::CpParallel => assignments(MvAlgorithm::Lsl, Criterion::Foldable, true),
            Algorithm::CpExLslParallel => {
                assignments(MvAlgorithm::ExtendedLsl, Criterion::Foldable, true)
            }
            Algorithm::MaekawaParallel => {
                assignments(MvAlgorithm::Plain, Criterion::Maekawa, true)
            }
        }
    }

    pub fn is_parallel(self) -> bool {
        matches!(self.plan(), Plan::Assignments { parallel: true, .. })
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_owned()))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Arguments of the default binary:
/// `flapcp <placeCount> <algorithm> [outputDir] [--threads N] [--verbose]`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub place_count: usize,
    pub algorithm: Algorithm,
    pub output_dir: Option<PathBuf>,
    pub threads: Option<usize>,
    pub verbose: bool,
}

impl RunConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_args(pico_args::Arguments::from_env())
    }

    pub fn from_args(mut args: pico_args::Arguments) -> Result<Self> {
        let verbose = args.contains(["-v", "--verbose"]);
        let threads = args.opt_value_from_str("--threads")?;

        let place_count = args.free_from_str()?;
        let algorithm = args.free_from_str()?;
        let output_dir = args.opt_free_from_str()?;

        let rest = args.finish();
        if !rest.is_empty() {
            return Err(Error::UnusedArguments(format!("{rest:?}")));
        }

        let config = Self {
            place_count,
            algorithm,
            output_dir,
            threads,
            verbose,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.place_count < 2 {
            return Err(Error::InvalidPlaceCount(self.place_count));
        }
        Ok(())
    }

    /// `<dir>/<algorithm>_<NNN>.txt`, when an output directory was given.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.output_dir.as_ref().map(|dir| {
            dir.join(format!(
                "{}_{:03}.txt",
                self.algorithm.name(),
                self.place_count
            ))
        })
    }
}

#[cfg(test)]
use std::ffi::OsString;

#[cfg(test)]
fn parse(args: &[&str]) -> Result<RunConfig> {
    RunConfig::from_args(pico_args::Arguments::from_vec(
        args.iter().map(OsString::from).collect(),
    ))
}

#[test]
fn test_algorithm_names() {
    for algorithm in Algorithm::ALL {
        assert_eq!(algorithm.name().parse::<Algorithm>().unwrap(), algorithm);
    }
    assert!(matches!(
        "cp_fast".parse::<Algorithm>(),
        Err(Error::UnknownAlgorithm(name)) if name == "cp_fast"
    ));
}

#[test]
fn test_plans() {
    assert_eq!(Algorithm::Kawasaki.plan(), Plan::Skeletons);
    assert_eq!(Algorithm::CpDirect.plan(), Plan::Direct);
    assert_eq!(
        Algorithm::CpMvLsl.plan(),
        Plan::Assignments {
            search: MvAlgorithm::Lsl,
            criterion: Criterion::Foldable,
            parallel: false,
        }
    );
    assert!(matches!(
        "cp_crimp".parse::<Algorithm>().unwrap().plan(),
        Plan::Assignments {
            search: MvAlgorithm::CrimpSequence,
            ..
        }
    ));
    assert!(Algorithm::CpExLslParallel.is_parallel());
    assert!(!Algorithm::CpLinearMv.is_parallel());
}

#[test]
fn test_parse() {
    let config = parse(&["16", "cp_linear", "out", "--threads", "4"]).unwrap();
    assert_eq!(config.place_count, 16);
    assert_eq!(config.algorithm, Algorithm::CpLinear);
    assert_eq!(config.threads, Some(4));
    assert!(!config.verbose);
    assert_eq!(
        config.output_path(),
        Some(PathBuf::from("out").join("cp_linear_016.txt"))
    );

    let config = parse(&["-v", "8", "kawasaki"]).unwrap();
    assert!(config.verbose);
    assert_eq!(config.output_path(), None);
}

#[test]
fn test_parse_errors() {
    assert!(matches!(parse(&["1", "cp"]), Err(Error::InvalidPlaceCount(1))));
    assert!(matches!(parse(&["8"]), Err(Error::Argument(_))));
    assert!(matches!(parse(&["8", "origami"]), Err(Error::Argument(_))));
    assert!(matches!(
        parse(&["8", "cp", "out", "extra"]),
        Err(Error::UnusedArguments(_))
    ));
}
