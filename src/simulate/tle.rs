use super::error::SimulateError;

/// One satellite's element set as handed to SGP4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSet<'a> {
    pub name: Option<&'a str>,
    pub line1: &'a str,
    pub line2: &'a str,
}

impl<'a> ElementSet<'a> {
    /// Accepts the two-line form and the three-line form with a name line,
    /// which may carry the `0 ` prefix used by 3LE files.
    pub fn split(text: &'a str) -> Result<Self, SimulateError> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let first = lines
            .next()
            .ok_or(SimulateError::InvalidTleFormat("empty input"))?;
        let second = lines
            .next()
            .ok_or(SimulateError::InvalidTleFormat("missing line 2"))?;

        let (name, line1, line2) = match lines.next() {
            Some(third) => (Some(first.strip_prefix("0 ").unwrap_or(first)), second, third),
            None => (None, first, second),
        };
        if lines.next().is_some() {
            return Err(SimulateError::InvalidTleFormat("more than one element set"));
        }
        if !line1.starts_with("1 ") || !line2.starts_with("2 ") {
            return Err(SimulateError::InvalidTleFormat(
                "element lines must start with 1 and 2",
            ));
        }

        Ok(Self { name, line1, line2 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_and_unnamed_sets() {
        let set = ElementSet::split("ISS\n1 aaa\n2 bbb\n").unwrap();
        assert_eq!(set.name, Some("ISS"));
        assert_eq!((set.line1, set.line2), ("1 aaa", "2 bbb"));

        let set = ElementSet::split("\n  1 aaa  \n\n2 bbb").unwrap();
        assert_eq!(set.name, None);
        assert_eq!(set.line1, "1 aaa");

        let set = ElementSet::split("0 ISS (ZARYA)\n1 aaa\n2 bbb").unwrap();
        assert_eq!(set.name, Some("ISS (ZARYA)"));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        for text in ["", "1 aaa", "a\nb\nc\nd", "ISS\n2 bbb\n1 aaa"] {
            assert!(
                matches!(
                    ElementSet::split(text),
                    Err(SimulateError::InvalidTleFormat(_))
                ),
                "accepted {:?}",
                text
            );
        }
    }
}
