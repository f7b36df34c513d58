//! Built-in configuration used when no stylepipe.yml is found

/// Compile the SCSS tree, then minify the main stylesheet
pub const BUILTIN_CONFIG: &str = r#"
name: stylepipe
usage: Compile SCSS to CSS, then minify the result
paths:
  base: ./
  css: ./css
  scss: ./scss
  node_modules: ./node_modules/
  vendor: ./vendor
tasks:
  scss:
    usage: Compile SCSS sources to CSS with prefixes and source maps
    source:
      - ${scss}/custom/**/*.scss
      - ${scss}/volt/**/*.scss
      - ${scss}/volt.scss
      - "!**/node_modules/**"
    pipe:
      - wait: 500
      - sourcemaps-init
      - sass
      - autoprefixer: ["> 1%"]
      - sourcemaps-write: .
    dest: ${css}
    reload: true

  minify:css:
    usage: Minify the compiled stylesheet to volt.min.css
    source:
      - ${css}/volt.css
      - "!**/node_modules/**"
    pipe:
      - clean-css
      - rename:
          extname: .min.css
    dest: ${css}

  default:
    usage: Compile SCSS and minify the result
    series:
      - scss
      - minify:css
"#;
