//! Locates the measurement-result section of an instrument log.

/// Yields the candidate data lines of one file.
///
/// Everything up to and including the first line containing `marker` is
/// skipped, then exactly one header line. Whatever follows is returned as a
/// candidate data line, including later marker lines. Without a marker the
/// iterator is empty.
pub fn data_lines<'a, I, S>(lines: I, marker: &'a str) -> DataLines<'a, I::IntoIter>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    DataLines {
        lines: lines.into_iter(),
        marker,
        in_section: false,
    }
}

/// Iterator returned by [`data_lines`].
pub struct DataLines<'a, I> {
    lines: I,
    marker: &'a str,
    in_section: bool,
}

impl<I, S> Iterator for DataLines<'_, I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = S;

    fn next(&mut self) -> Option<S> {
        if !self.in_section {
            loop {
                let line = self.lines.next()?;
                if line.as_ref().contains(self.marker) {
                    break;
                }
            }
            self.in_section = true;
            // column header
            self.lines.next()?;
        }
        self.lines.next()
    }
}
