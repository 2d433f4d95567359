//! Marker-delimited injection into an index template.

/// The comment pair delimiting the generated region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    /// Opening marker, e.g. `<!-- inject:html -->`
    pub start: String,
    /// Closing marker, e.g. `<!-- endinject -->`
    pub end: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            start: "<!-- inject:html -->".to_string(),
            end: "<!-- endinject -->".to_string(),
        }
    }
}

/// Errors that can occur when injecting into a template.
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("Start marker `{0}` not found")]
    MissingStart(String),

    #[error("End marker `{0}` not found after start marker")]
    MissingEnd(String),
}

/// Replace everything between the markers with `lines`.
///
/// Each line, and the end marker, is indented like the start marker.
pub fn inject_lines(
    template: &str,
    markers: &Markers,
    lines: &[String],
) -> Result<String, InjectError> {
    let start = template
        .find(&markers.start)
        .ok_or_else(|| InjectError::MissingStart(markers.start.clone()))?;
    let region_start = start + markers.start.len();

    let end = template[region_start..]
        .find(&markers.end)
        .map(|offset| region_start + offset)
        .ok_or_else(|| InjectError::MissingEnd(markers.end.clone()))?;

    let line_start = template[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let prefix = &template[line_start..start];
    let indent = if prefix.chars().all(|c| c == ' ' || c == '\t') {
        prefix
    } else {
        ""
    };

    let mut output = String::with_capacity(template.len() + lines.len() * 64);
    output.push_str(&template[..region_start]);
    output.push('\n');
    for line in lines {
        output.push_str(indent);
        output.push_str(line);
        output.push('\n');
    }
    output.push_str(indent);
    output.push_str(&template[end..]);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn replaces_region_between_markers() {
        let template = "<ul>\n  <!-- inject:html -->\n  <li>stale</li>\n  <!-- endinject -->\n</ul>\n";
        let lines = vec!["<li>a</li>".to_string(), "<li>b</li>".to_string()];

        let html = inject_lines(template, &Markers::default(), &lines).unwrap();

        assert_eq!(
            html,
            "<ul>\n  <!-- inject:html -->\n  <li>a</li>\n  <li>b</li>\n  <!-- endinject -->\n</ul>\n"
        );
    }

    #[test]
    fn empty_list_keeps_markers() {
        let template = "<!-- inject:html --><!-- endinject -->";

        let html = inject_lines(template, &Markers::default(), &[]).unwrap();

        assert_eq!(html, "<!-- inject:html -->\n<!-- endinject -->");
    }

    #[test]
    fn reinjecting_is_stable() {
        let template = "<ul>\n\t<!-- inject:html -->\n\t<!-- endinject -->\n</ul>";
        let lines = vec!["<li>x</li>".to_string()];

        let once = inject_lines(template, &Markers::default(), &lines).unwrap();
        let twice = inject_lines(&once, &Markers::default(), &lines).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn custom_markers() {
        let markers = Markers {
            start: "<!-- pages -->".to_string(),
            end: "<!-- /pages -->".to_string(),
        };

        let html = inject_lines("<!-- pages -->old<!-- /pages -->", &markers, &["new".to_string()])
            .unwrap();

        assert_eq!(html, "<!-- pages -->\nnew\n<!-- /pages -->");
    }

    #[test]
    fn missing_markers_are_errors() {
        let markers = Markers::default();

        assert!(matches!(
            inject_lines("<html></html>", &markers, &[]),
            Err(InjectError::MissingStart(_))
        ));
        assert!(matches!(
            inject_lines("<!-- endinject --><!-- inject:html -->", &markers, &[]),
            Err(InjectError::MissingEnd(_))
        ));
    }
}
