use crate::error::{AppError, Result};

pub const STORY_EXTENSION: &str = ".story";

/// Lowercase, collapse non-alphanumeric runs into `_`, trim `_` at both ends.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut gap = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if gap && !slug.is_empty() {
                slug.push('_');
            }
            gap = false;
            slug.push(c);
        } else {
            gap = true;
        }
    }
    slug
}

pub fn with_story_extension(name: &str) -> String {
    if name.ends_with(STORY_EXTENSION) {
        name.to_string()
    } else {
        format!("{}{}", name, STORY_EXTENSION)
    }
}

/// Accepts a bare artifact name, rejecting anything that could escape the stories directory.
pub fn checked_filename(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty()
        || name.starts_with('.')
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(AppError::Validation(format!("Invalid story filename: {:?}", name)));
    }
    Ok(with_story_extension(name))
}

/// Strips a UTF-8 byte order mark, if present.
pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_collapse_punctuation_runs() {
        assert_eq!(slugify("The Fox & the Silver Key!"), "the_fox_the_silver_key");
        assert_eq!(slugify("  --Hello,   World--  "), "hello_world");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn extension_is_added_once() {
        assert_eq!(with_story_extension("fox"), "fox.story");
        assert_eq!(with_story_extension("fox.story"), "fox.story");
    }

    #[test]
    fn rejects_path_like_names() {
        for bad in ["", "../etc/passwd", "a/b", "a\\b", ".hidden", "  "] {
            assert!(checked_filename(bad).is_err(), "{:?} should be rejected", bad);
        }
        assert_eq!(checked_filename("my_tale").unwrap(), "my_tale.story");
    }

    #[test]
    fn removes_byte_order_mark() {
        assert_eq!(strip_bom(&[0xEF, 0xBB, 0xBF, b'P', b'K']), b"PK");
        assert_eq!(strip_bom(b"PK"), b"PK");
    }
}
