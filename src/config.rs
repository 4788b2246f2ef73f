use std::env;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Config {
    pub(crate) particles: usize,
    pub(crate) fps: u64,
    pub(crate) seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            particles: 500,
            fps: 60,
            seed: 0,
        }
    }
}

pub(crate) fn parse_args() -> Config {
    let (cfg, help) = parse_from(env::args().skip(1));
    if help {
        println!(
            "lorenzfield\n\n\
             Three orthographic projections (XY, XZ, YZ) of particles riding\n\
             the Lorenz attractor, drawn as fading trails.\n\n\
             Usage:\n\
             \tlorenzfield [--particles N] [--fps N] [--seed N]\n\n\
             \t--particles N  particle count (default 500)\n\
             \t--fps N        frame cap (default 60)\n\
             \t--seed N       RNG seed, 0 = entropy (default 0)\n\n\
             Controls:\n\
             \tQ / Esc quit\n"
        );
        std::process::exit(0);
    }
    cfg
}

pub(crate) fn parse_from<I>(mut it: I) -> (Config, bool)
where
    I: Iterator<Item = String>,
{
    let mut cfg = Config::default();
    let mut help = false;

    while let Some(a) = it.next() {
        match a.as_str() {
            "--particles" => {
                if let Some(v) = it.next() {
                    cfg.particles = v.parse().unwrap_or(cfg.particles);
                }
            }
            "--fps" => {
                if let Some(v) = it.next() {
                    cfg.fps = v.parse().unwrap_or(cfg.fps);
                }
            }
            "--seed" => {
                if let Some(v) = it.next() {
                    cfg.seed = v.parse().unwrap_or(cfg.seed);
                }
            }
            "--help" | "-h" => help = true,
            _ => {}
        }
    }

    (cfg, help)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args<'a>(list: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
        list.iter().map(|s| s.to_string())
    }

    #[test]
    fn defaults_match_the_toy_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.particles, 500);
        assert_eq!(cfg.fps, 60);
        assert_eq!(cfg.seed, 0);
    }

    #[test]
    fn flags_override_defaults() {
        let (cfg, help) = parse_from(args(&["--particles", "100", "--fps", "30", "--seed", "9"]));
        assert!(!help);
        assert_eq!(cfg.particles, 100);
        assert_eq!(cfg.fps, 30);
        assert_eq!(cfg.seed, 9);
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let (cfg, _) = parse_from(args(&["--particles", "many", "--fps"]));
        assert_eq!(cfg.particles, 500);
        assert_eq!(cfg.fps, 60);
    }

    #[test]
    fn help_flag_is_reported() {
        let (_, help) = parse_from(args(&["--help"]));
        assert!(help);
    }
}
