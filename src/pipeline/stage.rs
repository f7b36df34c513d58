//! Stage implementations
//!
//! Each stage takes the whole stream and returns the next one. A file that
//! fails to compile or to parse as CSS is recorded and dropped; its siblings
//! carry on. Every other failure aborts the task.

use crate::config::{RenameOptions, SassOptions, SassStyle, Stage};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::file::{split_name, FileKind, SourceMapState, StyleFile};
use crate::pipeline::source::normalize_pattern;
use crate::pipeline::{CompileError, TaskReport};
use crate::runner::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;
use rsass::output::{Format, Style};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Run one stage over the stream
pub fn apply_stage(
    stage: &Stage,
    files: Vec<StyleFile>,
    ctx: &Context,
    report: &mut TaskReport,
) -> PipelineResult<Vec<StyleFile>> {
    ctx.print_debug(&format!("{} ({} file(s))", stage.name(), files.len()));

    match stage {
        Stage::Wait(ms) => {
            if !files.is_empty() && *ms > 0 {
                thread::sleep(Duration::from_millis(*ms));
            }
            Ok(files)
        }
        Stage::SourcemapsInit => Ok(files.into_iter().map(init_source_map).collect()),
        Stage::Sass(options) => Ok(compile_sass(options, files, ctx, report)),
        Stage::Autoprefixer(queries) => {
            let targets = resolve_targets(queries)?;
            transform_all(files, stage.name(), targets, false, ctx, report)
        }
        Stage::CleanCss => {
            transform_all(files, stage.name(), Targets::default(), true, ctx, report)
        }
        Stage::Rename(options) => Ok(files
            .into_iter()
            .map(|mut file| {
                if file.is_style() {
                    rename(options, &mut file);
                }
                file
            })
            .collect()),
        Stage::SourcemapsWrite(dir) => write_source_maps(dir.as_deref(), files),
    }
}

fn init_source_map(mut file: StyleFile) -> StyleFile {
    if file.is_style() {
        file.source_map = Some(SourceMapState {
            source_name: file.relative_url(),
            json: None,
        });
    }
    file
}

fn sass_format(options: &SassOptions) -> Format {
    let style = match options.style {
        SassStyle::Expanded => Style::Expanded,
        SassStyle::Compressed => Style::Compressed,
    };
    Format {
        style,
        ..Format::default()
    }
}

/// Compile SCSS files; partials are dropped, failures are logged and dropped
fn compile_sass(
    options: &SassOptions,
    files: Vec<StyleFile>,
    ctx: &Context,
    report: &mut TaskReport,
) -> Vec<StyleFile> {
    files
        .into_iter()
        .filter_map(|mut file| {
            if !file.is_style() {
                return Some(file);
            }
            if file.is_partial() {
                ctx.print_debug(&format!("Skipping partial {}", file.path.display()));
                return None;
            }

            let compiled = rsass::compile_scss_path(&file.path, sass_format(options))
                .map_err(|e| e.to_string())
                .and_then(|css| String::from_utf8(css).map_err(|e| e.to_string()));

            match compiled {
                Ok(css) => {
                    file.contents = css;
                    file.set_extension("css");
                    Some(file)
                }
                Err(message) => {
                    record_failure(file.source_path, message, ctx, report);
                    None
                }
            }
        })
        .collect()
}

fn record_failure(path: PathBuf, message: String, ctx: &Context, report: &mut TaskReport) {
    ctx.print_compile_error(&path, &message);
    report.compile_errors.push(CompileError { path, message });
}

/// Browser targets for a browserslist query
pub fn resolve_targets(queries: &[String]) -> PipelineResult<Targets> {
    let browsers =
        Browsers::from_browserslist(queries).map_err(|e| PipelineError::Browsers {
            query: queries.to_vec(),
            error: e.to_string(),
        })?;

    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Run a CSS transform over every style file; files CSS can't parse are dropped
fn transform_all(
    files: Vec<StyleFile>,
    stage: &str,
    targets: Targets,
    minify: bool,
    ctx: &Context,
    report: &mut TaskReport,
) -> PipelineResult<Vec<StyleFile>> {
    let mut out = Vec::with_capacity(files.len());

    for mut file in files {
        if !file.is_style() {
            out.push(file);
            continue;
        }

        match transform_css(&mut file, stage, targets.clone(), minify) {
            Ok(()) => out.push(file),
            Err(PipelineError::Transform { error, .. }) => {
                record_failure(file.source_path, format!("{}: {}", stage, error), ctx, report);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(out)
}

fn transform_error(stage: &str, path: &Path, error: impl Display) -> PipelineError {
    PipelineError::Transform {
        stage: stage.to_string(),
        path: path.to_path_buf(),
        error: error.to_string(),
    }
}

fn source_map_error(path: &Path, error: impl std::fmt::Debug) -> PipelineError {
    PipelineError::SourceMap {
        path: path.to_path_buf(),
        error: format!("{:?}", error),
    }
}

/// Parse, prefix for `targets`, and print one file
///
/// With source-map tracking on, the map produced here points back at this
/// stage's input. When an earlier transform already produced a map, the two
/// are composed so the result still points at the tracked input.
fn transform_css(
    file: &mut StyleFile,
    stage: &str,
    targets: Targets,
    minify: bool,
) -> PipelineResult<()> {
    let path = file.source_path.clone();
    let input = std::mem::take(&mut file.contents);

    let (code, map) = {
        let options = ParserOptions {
            filename: file.file_name(),
            ..ParserOptions::default()
        };
        let mut sheet =
            StyleSheet::parse(&input, options).map_err(|e| transform_error(stage, &path, e))?;

        sheet
            .minify(MinifyOptions {
                targets: targets.clone(),
                ..MinifyOptions::default()
            })
            .map_err(|e| transform_error(stage, &path, e))?;

        let mut source_map = match &file.source_map {
            Some(state) => {
                let mut map = SourceMap::new("/");
                map.add_source(&state.source_name);
                map.set_source_content(0, &input)
                    .map_err(|e| source_map_error(&path, e))?;
                Some(map)
            }
            None => None,
        };

        let output = sheet
            .to_css(PrinterOptions {
                minify,
                targets,
                source_map: source_map.as_mut(),
                ..PrinterOptions::default()
            })
            .map_err(|e| transform_error(stage, &path, e))?;

        let map = match source_map.as_mut() {
            Some(map) => {
                let previous = file.source_map.as_ref().and_then(|s| s.json.as_deref());
                if let Some(previous) = previous {
                    let mut previous =
                        SourceMap::from_json("/", previous).map_err(|e| source_map_error(&path, e))?;
                    map.extends(&mut previous)
                        .map_err(|e| source_map_error(&path, e))?;
                }
                Some(map.to_json(None).map_err(|e| source_map_error(&path, e))?)
            }
            None => None,
        };

        (output.code, map)
    };

    file.contents = code;
    if let (Some(state), Some(json)) = (file.source_map.as_mut(), map) {
        state.json = Some(json);
    }

    Ok(())
}

/// Apply a rename to a file's name
pub fn rename(options: &RenameOptions, file: &mut StyleFile) {
    let name = file.file_name();
    let (stem, extension) = split_name(&name);

    let renamed = format!(
        "{}{}{}{}",
        options.prefix.as_deref().unwrap_or(""),
        options.basename.as_deref().unwrap_or(stem),
        options.suffix.as_deref().unwrap_or(""),
        options.extname.as_deref().unwrap_or(extension),
    );
    file.set_file_name(&renamed);
}

/// Line-for-line map used when no CSS transform produced one
fn identity_map(source_name: &str, contents: &str) -> String {
    let lines = contents.lines().count().max(1);
    let mut mappings = String::from("AAAA");
    for _ in 1..lines {
        mappings.push_str(";AACA");
    }

    serde_json::json!({
        "version": 3,
        "sources": [source_name],
        "sourcesContent": [contents],
        "names": [],
        "mappings": mappings,
    })
    .to_string()
}

/// Set the map's `file` field to the generated file name
fn finish_map(json: &str, file_name: &str, path: &Path) -> PipelineResult<String> {
    let mut map: serde_json::Value =
        serde_json::from_str(json).map_err(|e| source_map_error(path, e))?;
    if let Some(object) = map.as_object_mut() {
        object.insert("file".to_string(), serde_json::Value::from(file_name));
    }
    serde_json::to_string(&map).map_err(|e| source_map_error(path, e))
}

fn append_map_comment(contents: &mut String, url: &str) {
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(&format!("/*# sourceMappingURL={} */\n", url));
}

/// Emit tracked source maps, either inline or as sibling `.map` files under `dir`
fn write_source_maps(dir: Option<&str>, files: Vec<StyleFile>) -> PipelineResult<Vec<StyleFile>> {
    let mut out = Vec::with_capacity(files.len() * 2);

    for mut file in files {
        let state = match file.source_map.take() {
            Some(state) if file.is_style() => state,
            other => {
                file.source_map = other;
                out.push(file);
                continue;
            }
        };

        let raw = match state.json {
            Some(json) => json,
            None => identity_map(&state.source_name, &file.contents),
        };
        let json = finish_map(&raw, &file.file_name(), &file.source_path)?;

        match dir {
            None => {
                let url = format!(
                    "data:application/json;charset=utf8;base64,{}",
                    STANDARD.encode(json.as_bytes())
                );
                append_map_comment(&mut file.contents, &url);
                out.push(file);
            }
            Some(dir) => {
                let dir = normalize_pattern(dir);
                let mut map_name = file.relative().into_os_string();
                map_name.push(".map");

                let (map_path, url) = if dir.is_empty() {
                    (
                        file.base.join(&map_name),
                        format!("{}.map", file.file_name()),
                    )
                } else {
                    (
                        file.base.join(&dir).join(&map_name),
                        format!(
                            "{}{}/{}.map",
                            "../".repeat(file.depth()),
                            dir.trim_end_matches('/'),
                            file.relative_url()
                        ),
                    )
                };

                append_map_comment(&mut file.contents, &url);
                let map_file = StyleFile {
                    base: file.base.clone(),
                    source_path: file.source_path.clone(),
                    path: map_path,
                    contents: json,
                    kind: FileKind::SourceMap,
                    source_map: None,
                };
                out.push(file);
                out.push(map_file);
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Verbosity;
    use std::fs;
    use tempfile::TempDir;

    fn quiet() -> Context {
        Context::new().with_verbosity(Verbosity::Silent)
    }

    fn css_file(name: &str, contents: &str) -> StyleFile {
        StyleFile::new(
            PathBuf::from("/site/css"),
            PathBuf::from(format!("/site/css/{}", name)),
            contents.to_string(),
        )
    }

    fn scss_file(dir: &TempDir, rel: &str, contents: &str) -> StyleFile {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        StyleFile::new(dir.path().to_path_buf(), path, contents.to_string())
    }

    #[test]
    fn test_sass_compiles_and_renames_extension() {
        let dir = TempDir::new().unwrap();
        let file = scss_file(&dir, "volt.scss", "$c: red;\n.volt { .inner { color: $c; } }\n");
        let mut report = TaskReport::default();

        let out = apply_stage(
            &Stage::Sass(SassOptions::default()),
            vec![file],
            &quiet(),
            &mut report,
        )
        .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].relative(), PathBuf::from("volt.css"));
        assert!(out[0].contents.contains(".volt .inner"));
        assert!(out[0].contents.contains("color: red"));
        assert!(report.compile_errors.is_empty());
    }

    #[test]
    fn test_sass_error_drops_only_failing_file() {
        let dir = TempDir::new().unwrap();
        let good = scss_file(&dir, "good.scss", ".good { color: blue; }\n");
        let bad = scss_file(&dir, "bad.scss", ".bad { color: blue;\n");
        let mut report = TaskReport::default();

        let out = apply_stage(
            &Stage::Sass(SassOptions::default()),
            vec![bad, good],
            &quiet(),
            &mut report,
        )
        .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].file_name(), "good.css");
        assert_eq!(report.compile_errors.len(), 1);
        assert!(report.compile_errors[0].path.ends_with("bad.scss"));
    }

    #[test]
    fn test_sass_skips_partials() {
        let dir = TempDir::new().unwrap();
        let partial = scss_file(&dir, "_vars.scss", "$c: red;\n");
        let main = scss_file(&dir, "main.scss", "@import 'vars';\n.a { color: $c; }\n");
        let mut report = TaskReport::default();

        let out = apply_stage(
            &Stage::Sass(SassOptions::default()),
            vec![partial, main],
            &quiet(),
            &mut report,
        )
        .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].file_name(), "main.css");
        assert!(out[0].contents.contains("color: red"));
    }

    #[test]
    fn test_clean_css_minifies() {
        let input = ".volt {\n  color: red;\n  margin: 0px;\n}\n";
        let mut report = TaskReport::default();

        let out = apply_stage(
            &Stage::CleanCss,
            vec![css_file("volt.css", input)],
            &quiet(),
            &mut report,
        )
        .unwrap();

        assert!(out[0].contents.len() < input.len());
        assert!(out[0].contents.contains(".volt{"));
        assert!(out[0].contents.contains("color:red"));
        assert!(!out[0].contents.trim_end().contains('\n'));
    }

    #[test]
    fn test_autoprefixer_adds_vendor_prefixes() {
        let mut report = TaskReport::default();
        let out = apply_stage(
            &Stage::Autoprefixer(vec!["> 1%".to_string()]),
            vec![css_file("volt.css", ".a { user-select: none; mask-image: none; }\n")],
            &quiet(),
            &mut report,
        )
        .unwrap();

        assert!(out[0].contents.contains("-webkit-user-select: none"));
        assert!(out[0].contents.contains("-webkit-mask-image: none"));
        assert!(out[0].contents.contains("user-select: none"));
    }

    #[test]
    fn test_unparseable_css_drops_only_that_file() {
        let dir = TempDir::new().unwrap();
        let legacy = scss_file(&dir, "custom/legacy.scss", ".x { *zoom: 1; }\n");
        let volt = scss_file(&dir, "volt.scss", ".ok { color: red; }\n");
        let ctx = quiet();
        let mut report = TaskReport::default();

        let files = apply_stage(
            &Stage::Sass(SassOptions::default()),
            vec![legacy, volt],
            &ctx,
            &mut report,
        )
        .unwrap();
        assert_eq!(files.len(), 2);

        let out = apply_stage(
            &Stage::Autoprefixer(vec!["> 1%".to_string()]),
            files,
            &ctx,
            &mut report,
        )
        .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].file_name(), "volt.css");
        assert_eq!(report.compile_errors.len(), 1);
        assert!(report.compile_errors[0].path.ends_with("custom/legacy.scss"));
        assert!(report.compile_errors[0].message.starts_with("autoprefixer: "));
    }

    #[test]
    fn test_autoprefixer_keeps_rules() {
        let mut report = TaskReport::default();
        let out = apply_stage(
            &Stage::Autoprefixer(vec!["> 1%".to_string()]),
            vec![css_file("volt.css", ".volt { display: flex; }\n")],
            &quiet(),
            &mut report,
        )
        .unwrap();

        assert!(out[0].contents.contains(".volt"));
        assert!(out[0].contents.contains("display: flex"));
    }

    #[test]
    fn test_invalid_browser_query() {
        let result = resolve_targets(&["not a real query at all".to_string()]);
        assert!(matches!(result, Err(PipelineError::Browsers { .. })));
    }

    #[test]
    fn test_rename_extname() {
        let mut file = css_file("volt.css", "");
        rename(
            &RenameOptions {
                extname: Some(".min.css".to_string()),
                ..Default::default()
            },
            &mut file,
        );
        assert_eq!(file.file_name(), "volt.min.css");
        assert_eq!(file.path, PathBuf::from("/site/css/volt.min.css"));
    }

    #[test]
    fn test_rename_prefix_suffix_basename() {
        let mut file = css_file("volt.css", "");
        rename(
            &RenameOptions {
                prefix: Some("app-".to_string()),
                basename: Some("theme".to_string()),
                suffix: Some(".v2".to_string()),
                extname: None,
            },
            &mut file,
        );
        assert_eq!(file.file_name(), "app-theme.v2.css");
    }

    #[test]
    fn test_sourcemaps_write_external() {
        let mut report = TaskReport::default();
        let ctx = quiet();
        let files = vec![css_file("volt.css", ".volt {\n  color: red;\n}\n")];

        let files = apply_stage(&Stage::SourcemapsInit, files, &ctx, &mut report).unwrap();
        let files = apply_stage(
            &Stage::SourcemapsWrite(Some(".".to_string())),
            files,
            &ctx,
            &mut report,
        )
        .unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[0]
            .contents
            .ends_with("/*# sourceMappingURL=volt.css.map */\n"));
        assert_eq!(files[1].kind, FileKind::SourceMap);
        assert_eq!(files[1].relative(), PathBuf::from("volt.css.map"));

        let map: serde_json::Value = serde_json::from_str(&files[1].contents).unwrap();
        assert_eq!(map["version"], 3);
        assert_eq!(map["file"], "volt.css");
        assert_eq!(map["sources"][0], "volt.css");
        assert_eq!(map["mappings"], "AAAA;AACA;AACA");
    }

    #[test]
    fn test_sourcemaps_write_into_subdir() {
        let mut report = TaskReport::default();
        let ctx = quiet();
        let file = StyleFile::new(
            PathBuf::from("/site/css"),
            PathBuf::from("/site/css/pages/home.css"),
            ".home { color: red; }\n".to_string(),
        );

        let files = apply_stage(&Stage::SourcemapsInit, vec![file], &ctx, &mut report).unwrap();
        let files = apply_stage(
            &Stage::SourcemapsWrite(Some("./maps".to_string())),
            files,
            &ctx,
            &mut report,
        )
        .unwrap();

        assert!(files[0]
            .contents
            .contains("sourceMappingURL=../maps/pages/home.css.map"));
        assert_eq!(files[1].path, PathBuf::from("/site/css/maps/pages/home.css.map"));
    }

    #[test]
    fn test_sourcemaps_write_inline() {
        let mut report = TaskReport::default();
        let ctx = quiet();
        let files = vec![css_file("volt.css", ".volt { color: red; }\n")];

        let files = apply_stage(&Stage::SourcemapsInit, files, &ctx, &mut report).unwrap();
        let files = apply_stage(&Stage::SourcemapsWrite(None), files, &ctx, &mut report).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0]
            .contents
            .contains("sourceMappingURL=data:application/json;charset=utf8;base64,"));
    }

    #[test]
    fn test_transform_records_source_map() {
        let mut report = TaskReport::default();
        let ctx = quiet();
        let files = vec![css_file("volt.css", ".volt { color: red; }\n")];

        let files = apply_stage(&Stage::SourcemapsInit, files, &ctx, &mut report).unwrap();
        let files = apply_stage(
            &Stage::Autoprefixer(vec!["> 1%".to_string()]),
            files,
            &ctx,
            &mut report,
        )
        .unwrap();

        let state = files[0].source_map.as_ref().unwrap();
        let map: serde_json::Value = serde_json::from_str(state.json.as_ref().unwrap()).unwrap();
        assert_eq!(map["version"], 3);
    }

    #[test]
    fn test_chained_transforms_map_to_tracked_input() {
        let mut report = TaskReport::default();
        let ctx = quiet();
        let input = ".volt {\n  user-select: none;\n}\n\n.btn {\n  color: red;\n}\n";
        let files = vec![css_file("volt.css", input)];

        let files = apply_stage(&Stage::SourcemapsInit, files, &ctx, &mut report).unwrap();
        let files = apply_stage(
            &Stage::Autoprefixer(vec!["> 1%".to_string()]),
            files,
            &ctx,
            &mut report,
        )
        .unwrap();
        let files = apply_stage(&Stage::CleanCss, files, &ctx, &mut report).unwrap();
        let files = apply_stage(
            &Stage::SourcemapsWrite(Some(".".to_string())),
            files,
            &ctx,
            &mut report,
        )
        .unwrap();

        let map: serde_json::Value = serde_json::from_str(&files[1].contents).unwrap();
        assert_eq!(map["sources"].as_array().unwrap().len(), 1);
        assert_eq!(map["sourcesContent"][0], input);
    }

    #[test]
    fn test_wait_passes_files_through() {
        let mut report = TaskReport::default();
        let files = vec![css_file("volt.css", ".a{}")];
        let out = apply_stage(&Stage::Wait(1), files, &quiet(), &mut report).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].contents, ".a{}");
    }
}
