//! Scaffold a starter project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Starter files, relative to the project root.
const FILES: &[(&str, &str)] = &[
    ("brisk.toml", DEFAULT_CONFIG),
    ("src/index.html", DEFAULT_INDEX),
    ("src/about.html", DEFAULT_ABOUT),
    ("src/contact.html", DEFAULT_CONTACT),
    ("src/layouts/head.html", DEFAULT_HEAD),
    ("src/layouts/header.html", DEFAULT_HEADER),
    ("src/layouts/footer.html", DEFAULT_FOOTER),
    ("src/scss/_variables.scss", DEFAULT_VARIABLES),
    ("src/scss/main.scss", DEFAULT_MAIN_SCSS),
    ("src/js/scripts.js", DEFAULT_SCRIPT),
];

/// Run the init command in `root`.
pub async fn run(root: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing brisk in {}...", root.display());

    let src_dir = root.join("src");
    if src_dir.exists() && !yes {
        tracing::warn!("src/ directory already exists. Use --yes to overwrite.");
        return Ok(());
    }

    for (rel, contents) in FILES {
        let path = root.join(rel);
        if path.exists() && !yes {
            tracing::debug!("Keeping existing {}", rel);
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", rel))?;
        tracing::info!("Created {}", rel);
    }

    let images = src_dir.join("images");
    fs::create_dir_all(&images).context("Failed to create images directory")?;

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'brisk' to build and start the dev server.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r##"# brisk configuration. Every key is optional; the values below are the
# defaults.

[paths]
source_root = "src"
output_root = "build"
markup = ["src/**/*.{html,php}", "!src/layouts/**/*.html", "!src/index.html"]
layouts = ["src/layouts/**/*.html"]
template = "src/index.html"
scripts = ["src/js/**/*.js"]
styles = ["src/scss/**/*.{scss,sass}"]
images = ["src/images/**/*.*"]
markup_dest = "build"
scripts_dest = "build/js"
styles_dest = "build/css"
images_dest = "build/images"

[styles]
# "compressed" or "expanded"
output_style = "compressed"
browsers = ["last 2 versions"]

[scripts]
bundle = "scripts.js"
minify = true

[images]
jpeg_quality = 90
png_level = 5

[index]
start_marker = "<!-- inject:html -->"
end_marker = "<!-- endinject -->"
link_template = '<li><a href="{{ path }}" target="_blank">{{ path }}</a></li>'

[server]
host = "localhost"
port = 9000
open = true
"##;

const DEFAULT_INDEX: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Pages</title>
  <link rel="stylesheet" href="css/main.css">
</head>
<body>
  <h1>Pages</h1>
  <ul>
    <!-- inject:html -->
    <!-- endinject -->
  </ul>
</body>
</html>
"##;

const DEFAULT_ABOUT: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  //= layouts/head.html
  <title>About</title>
</head>
<body>
  //= layouts/header.html
  <main>
    <h1 data-animation>About</h1>
    <p data-animation>Edit src/about.html and save to see it reload.</p>
  </main>
  //= layouts/footer.html
</body>
</html>
"##;

const DEFAULT_CONTACT: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  //= layouts/head.html
  <title>Contact</title>
</head>
<body>
  //= layouts/header.html
  <main>
    <h1 data-animation>Contact</h1>
    <p data-animation>hello@example.com</p>
  </main>
  //= layouts/footer.html
</body>
</html>
"##;

const DEFAULT_HEAD: &str = r##"<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<link rel="stylesheet" href="css/main.css">
"##;

const DEFAULT_HEADER: &str = r##"<header class="nav-bar">
  <a href="#" id="open_menu">Menu</a>
  <nav>
    <a href="about.html">About</a>
    <a href="contact.html">Contact</a>
  </nav>
</header>
"##;

const DEFAULT_FOOTER: &str = r##"<footer>
  <small>Built with brisk</small>
</footer>
<script src="js/scripts.js"></script>
"##;

const DEFAULT_VARIABLES: &str = r##"$brand: #336699;
$text: #222;
$menu-width: 240px;
"##;

const DEFAULT_MAIN_SCSS: &str = r##"@use 'variables' as *;

body {
  margin: 0;
  min-height: calc(var(--vh, 1vh) * 100);
  color: $text;
  font-family: system-ui, sans-serif;
}

.nav-bar {
  display: flex;
  justify-content: space-between;
  padding: 1rem;
  background: $brand;
  user-select: none;

  a {
    color: #fff;
  }

  nav {
    position: fixed;
    top: 0;
    left: -$menu-width;
    width: $menu-width;
    transition: transform 0.3s ease;
  }
}

html.push .nav-bar nav {
  transform: translateX($menu-width);
}

[data-animation] {
  opacity: 0;
  transition: opacity 0.6s ease;

  &.is-inview {
    opacity: 1;
  }
}
"##;

const DEFAULT_SCRIPT: &str = r##"'use strict';

var LAZYSIZES_URL = 'https://cdnjs.cloudflare.com/ajax/libs/lazysizes/5.2.0/lazysizes.min.js';

// State shared by the page handlers below.
var session = {
    root: document.documentElement,
    lazySizesRequested: false
};

function correctVh(session) {
    var vh = window.innerHeight * 0.01;
    session.root.style.setProperty('--vh', vh + 'px');
}

function lazyLoad(session) {
    if ('loading' in HTMLImageElement.prototype) {
        document.querySelectorAll('img.lazyload').forEach(function (img) {
            img.onload = function () {
                img.classList.add('lazyloaded');
            };
            img.src = img.dataset.src;
        });
        return;
    }

    // lazysizes marks images itself once loaded.
    if (!session.lazySizesRequested) {
        session.lazySizesRequested = true;
        var script = document.createElement('script');
        script.async = true;
        script.src = LAZYSIZES_URL;
        document.body.appendChild(script);
    }
}

function initMobileMenu(session) {
    var pushClass = 'push';
    var navbar = document.querySelector('.nav-bar');

    document.querySelectorAll('#open_menu').forEach(function (button) {
        button.addEventListener('click', function (event) {
            event.preventDefault();
            session.root.classList.toggle(pushClass);
        });

        if (navbar) {
            document.addEventListener('click', function (event) {
                if (!navbar.contains(event.target) && !button.contains(event.target)) {
                    session.root.classList.remove(pushClass);
                }
            });
        }
    });
}

function revealInView(session) {
    var scrollTop = session.root.scrollTop || document.body.scrollTop;
    var viewportBottom = scrollTop + window.innerHeight;

    document.querySelectorAll('[data-animation]').forEach(function (item) {
        var offset = item.getBoundingClientRect().top + window.scrollY;
        if (offset < viewportBottom) {
            item.classList.add('is-inview');
        }
    });
}

document.addEventListener('DOMContentLoaded', function () {
    lazyLoad(session);
    correctVh(session);
    initMobileMenu(session);
}, false);

window.addEventListener('resize', function () {
    correctVh(session);
});

window.addEventListener('load', function () {
    revealInView(session);
});

window.addEventListener('scroll', function () {
    revealInView(session);
});
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use brisk_pipeline::{PathMap, Pipeline};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn scaffold_builds_cleanly() {
        let temp = tempdir().unwrap();

        run(temp.path(), false).await.unwrap();
        let settings = crate::config::load(&temp.path().join("brisk.toml")).unwrap();
        assert_eq!(settings.build.paths, PathMap::default());
        assert_eq!(settings.server.port, 9000);

        let pipeline = Arc::new(Pipeline::new(settings.build).unwrap());
        let summary = Arc::clone(&pipeline).build().await.unwrap();
        assert!(summary.is_ok(), "{:?}", summary.reports);

        let out = temp.path().join("build");
        let index = fs::read_to_string(out.join("index.html")).unwrap();
        let about_link = index.find("href=\"about.html\"").unwrap();
        let contact_link = index.find("href=\"contact.html\"").unwrap();
        assert!(about_link < contact_link);
        assert!(!index.contains("layouts/"));

        let about = fs::read_to_string(out.join("about.html")).unwrap();
        assert!(about.contains("  <header class=\"nav-bar\">"));
        assert!(!about.contains("//="));
        assert!(out.join("css/main.css").exists());
        assert!(!out.join("css/_variables.css").exists());
        assert!(out.join("js/scripts.js").exists());
    }

    #[tokio::test]
    async fn existing_project_is_left_alone() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("brisk.toml"), "# mine\n").unwrap();

        run(temp.path(), false).await.unwrap();

        assert_eq!(fs::read_to_string(temp.path().join("brisk.toml")).unwrap(), "# mine\n");
        assert!(!temp.path().join("src/index.html").exists());
    }

    #[tokio::test]
    async fn yes_overwrites() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("brisk.toml"), "# mine\n").unwrap();

        run(temp.path(), true).await.unwrap();

        assert_eq!(fs::read_to_string(temp.path().join("brisk.toml")).unwrap(), DEFAULT_CONFIG);
        assert!(temp.path().join("src/js/scripts.js").exists());
        assert!(temp.path().join("src/images").is_dir());
    }
}
