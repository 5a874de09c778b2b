//! Build environment for the browser target.

/// Target OS for the browser-embedded runtime.
pub const TARGET_OS: &str = "js";
/// Target architecture for the browser-embedded runtime.
pub const TARGET_ARCH: &str = "wasm";

const MODULE_MODE: &str = "GO111MODULE";

/// Environment overrides for a `go build` targeting the browser.
///
/// `GOOS`/`GOARCH` always point at `js`/`wasm`. Module mode is forced on
/// unless the inherited environment already sets `GO111MODULE`.
pub fn target_env<I, K, V>(inherited: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut env = vec![
        ("GOOS".to_string(), TARGET_OS.to_string()),
        ("GOARCH".to_string(), TARGET_ARCH.to_string()),
    ];
    if module_mode(inherited).is_none() {
        env.push((MODULE_MODE.to_string(), "on".to_string()));
    }
    env
}

/// Whether builds run in module mode, given the final environment.
///
/// Only an explicit `GO111MODULE=off` disables it.
pub fn module_mode_enabled<I, K, V>(env: I) -> bool
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    module_mode(env).is_none_or(|value| !value.eq_ignore_ascii_case("off"))
}

/// Last `GO111MODULE` value in `env`, if any.
fn module_mode<I, K, V>(env: I) -> Option<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    env.into_iter()
        .filter(|(k, _)| k.as_ref() == MODULE_MODE)
        .last()
        .map(|(_, v)| v.as_ref().to_string())
}
