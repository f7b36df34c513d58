//! Variable interpolation for strings
//!
//! This module handles parsing and replacing variables in strings using the ${var} syntax.

use crate::error::{InterpolationError, InterpolationResult};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;

/// Substitution passes allowed before a value is considered self-referencing
const MAX_PASSES: usize = 16;

fn var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid interpolation pattern"))
}

/// Interpolate variables in a string
///
/// Supports:
/// - `${var}` - variable from context
/// - Environment variables (when not found in context)
///
/// Unknown variables are left untouched.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> InterpolationResult<String> {
    let re = var_pattern();
    let mut result = s.to_string();

    for _ in 0..MAX_PASSES {
        let mut changed = false;

        let next = re
            .replace_all(&result, |caps: &Captures| {
                let var_name = &caps[1];

                if let Some(value) = vars.get(var_name) {
                    changed = true;
                    return value.clone();
                }

                if let Ok(value) = env::var(var_name) {
                    changed = true;
                    return value;
                }

                caps[0].to_string()
            })
            .into_owned();

        if !changed {
            return Ok(next);
        }
        result = next;
    }

    Err(InterpolationError::RecursiveInterpolation)
}

/// Interpolate with strict mode - errors on undefined variables
pub fn interpolate_strict(
    s: &str,
    vars: &HashMap<String, String>,
) -> InterpolationResult<String> {
    let result = interpolate(s, vars)?;

    if let Some(caps) = var_pattern().captures(&result) {
        return Err(InterpolationError::UndefinedVariable(caps[1].to_string()));
    }

    Ok(result)
}

/// Strictly interpolate a list of strings
pub fn interpolate_list(
    list: &[String],
    vars: &HashMap<String, String>,
) -> InterpolationResult<Vec<String>> {
    list.iter().map(|s| interpolate_strict(s, vars)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("css".to_string(), "./css".to_string());
        vars.insert("scss".to_string(), "./scss".to_string());
        vars
    }

    #[test]
    fn test_simple_interpolation() {
        let result = interpolate("${scss}/volt.scss", &paths()).unwrap();
        assert_eq!(result, "./scss/volt.scss");
    }

    #[test]
    fn test_repeated_variable() {
        let result = interpolate("${css} and ${css}", &paths()).unwrap();
        assert_eq!(result, "./css and ./css");
    }

    #[test]
    fn test_environment_variable() {
        env::set_var("STYLEPIPE_TEST_OUT", "public");

        let result = interpolate("${STYLEPIPE_TEST_OUT}/css", &HashMap::new()).unwrap();
        assert_eq!(result, "public/css");

        env::remove_var("STYLEPIPE_TEST_OUT");
    }

    #[test]
    fn test_undefined_variable_lenient() {
        let result = interpolate("${fonts}/a.woff", &paths()).unwrap();
        assert_eq!(result, "${fonts}/a.woff");
    }

    #[test]
    fn test_undefined_variable_strict() {
        let result = interpolate_strict("${fonts}/a.woff", &paths());
        assert!(matches!(
            result,
            Err(InterpolationError::UndefinedVariable(name)) if name == "fonts"
        ));
    }

    #[test]
    fn test_nested_interpolation() {
        let mut vars = paths();
        vars.insert("theme".to_string(), "${scss}/themes".to_string());

        let result = interpolate("${theme}/dark.scss", &vars).unwrap();
        assert_eq!(result, "./scss/themes/dark.scss");
    }

    #[test]
    fn test_recursive_interpolation() {
        let mut vars = HashMap::new();
        vars.insert("a".to_string(), "${b}".to_string());
        vars.insert("b".to_string(), "${a}".to_string());

        let result = interpolate("${a}", &vars);
        assert!(matches!(result, Err(InterpolationError::RecursiveInterpolation)));
    }

    #[test]
    fn test_interpolate_list() {
        let list = vec![
            "${scss}/custom/**/*.scss".to_string(),
            "!**/node_modules/**".to_string(),
        ];

        let result = interpolate_list(&list, &paths()).unwrap();
        assert_eq!(result[0], "./scss/custom/**/*.scss");
        assert_eq!(result[1], "!**/node_modules/**");
    }

    #[test]
    fn test_no_interpolation() {
        let result = interpolate("css/volt.css", &HashMap::new()).unwrap();
        assert_eq!(result, "css/volt.css");
    }
}
