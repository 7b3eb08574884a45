/// Derive a file name from a publication's title.
///
/// Lower-cases the title, replaces every non-alphanumeric character with
/// an underscore, collapses runs of underscores, and truncates the result
/// to 50 characters.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_underscore = false;

    for ch in title.chars() {
        let ch = if ch.is_ascii_alphanumeric() {
            ch.to_ascii_lowercase()
        } else {
            '_'
        };

        if ch == '_' {
            if last_underscore {
                continue;
            }
            last_underscore = true;
        } else {
            last_underscore = false;
        }

        slug.push(ch);

        if slug.len() == 50 {
            break;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_replaces() {
        assert_eq!(slugify("Sobre el Ajolote"), "sobre_el_ajolote");
    }

    #[test]
    fn slugify_collapses_repeats() {
        assert_eq!(slugify("a -- b"), "a_b");
    }

    #[test]
    fn slugify_truncates_to_50() {
        let long = "x".repeat(80);
        assert_eq!(slugify(&long).len(), 50);
    }

    #[test]
    fn slugify_non_ascii_becomes_underscore() {
        assert_eq!(slugify("año"), "a_o");
    }
}
