use regex::Regex;

/// Split model output into exactly `count` scene texts.
///
/// Scenes are found by their `SCENE n:` (or `Part n`) markers. Without markers the
/// paragraphs are spread across the scenes. Missing scenes are padded with a
/// placeholder and extra ones are dropped.
pub fn split_scenes(text: &str, count: usize) -> Vec<String> {
    let mut scenes = scenes_by_marker(text);
    if scenes.len() <= 1 {
        scenes = scenes_by_paragraph(text, count);
    }

    while scenes.len() < count {
        scenes.push(format!(
            "Scene {} description not available.",
            scenes.len() + 1
        ));
    }
    scenes.truncate(count);
    scenes
}

fn scenes_by_marker(text: &str) -> Vec<String> {
    let patterns = [
        r"(?i)^\W*scene\s+(\d+)\W*?[:.\-][\s*_]*(.*)$", // SCENE 1: text, **Scene 2:** text
        r"(?i)^\W*scene\s+(\d+)\W*$",               // SCENE 3 on its own line
        r"(?i)^\W*part\s+(\d+)\s*[:.\-]\s*(.*)$",   // Part 1: text
    ];
    let markers: Vec<Regex> = patterns
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect();

    let mut scenes = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines().map(str::trim) {
        let opening = markers.iter().find_map(|marker| marker.captures(line));
        match opening {
            Some(captures) => {
                if let Some(done) = current.take().filter(|s| !s.trim().is_empty()) {
                    scenes.push(done.trim().to_string());
                }
                let rest = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");
                current = Some(rest.to_string());
            }
            None => {
                if let Some(scene) = current.as_mut() {
                    if !line.is_empty() {
                        if !scene.is_empty() {
                            scene.push(' ');
                        }
                        scene.push_str(line);
                    }
                }
            }
        }
    }

    if let Some(done) = current.filter(|s| !s.trim().is_empty()) {
        scenes.push(done.trim().to_string());
    }
    scenes
}

fn scenes_by_paragraph(text: &str, count: usize) -> Vec<String> {
    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if count == 0 || paragraphs.len() < count {
        return paragraphs.into_iter().map(str::to_string).collect();
    }

    let per_scene = paragraphs.len() / count;
    (0..count)
        .map(|i| {
            let start = i * per_scene;
            let end = if i + 1 == count {
                paragraphs.len()
            } else {
                start + per_scene
            };
            paragraphs[start..end].join("\n\n")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_scene_markers() {
        let text = "Here is your story.\n\nSCENE 1: The fox wakes.\nIt is cold.\n\n\
SCENE 2: A key glints.\n\n**Scene 3:** The door opens.";
        let scenes = split_scenes(text, 3);
        assert_eq!(
            scenes,
            vec![
                "The fox wakes. It is cold.",
                "A key glints.",
                "The door opens."
            ]
        );
    }

    #[test]
    fn marker_on_its_own_line_takes_following_text() {
        let text = "SCENE 1\nFirst light.\nSCENE 2\nSecond light.";
        assert_eq!(split_scenes(text, 2), vec!["First light.", "Second light."]);
    }

    #[test]
    fn falls_back_to_paragraphs() {
        let text = "One.\n\nTwo.\n\nThree.\n\nFour.";
        let scenes = split_scenes(text, 3);
        assert_eq!(scenes, vec!["One.", "Two.", "Three.\n\nFour."]);
    }

    #[test]
    fn pads_and_truncates_to_requested_count() {
        let padded = split_scenes("SCENE 1: Only one.\nSCENE 2: And two.", 4);
        assert_eq!(padded.len(), 4);
        assert_eq!(padded[3], "Scene 4 description not available.");

        let text = "SCENE 1: a\nSCENE 2: b\nSCENE 3: c\nSCENE 4: d";
        assert_eq!(split_scenes(text, 3), vec!["a", "b", "c"]);
    }
}
