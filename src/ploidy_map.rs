use std::collections::HashMap;

use crate::sex_map::SexMapEntry;

/// Per-sample haploid designation, parallel to the header's sample list.
///
/// Built once per run and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PloidyMap {
    haploid: Vec<bool>,
    haploid_count: usize,
}

impl PloidyMap {
    /// Every sample diploid.
    pub fn diploid(sample_count: usize) -> Self {
        Self::from(vec![false; sample_count])
    }

    /// Every sample haploid.
    pub fn all_haploid(sample_count: usize) -> Self {
        Self::from(vec![true; sample_count])
    }

    /// Build from an ordered identifier -> haploid flag table.
    ///
    /// Samples the table does not name stay diploid; when an identifier is
    /// repeated the later entry wins. Identifiers that name no sample are
    /// logged and returned so the caller can account for them.
    pub fn from_table<I, S>(sample_ids: &[String], table: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (S, bool)>,
        S: AsRef<str>,
    {
        let id_to_idx: HashMap<&str, usize> = sample_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.as_str(), idx))
            .collect();

        let mut haploid = vec![false; sample_ids.len()];
        let mut unmatched = Vec::new();

        for (id, is_haploid) in table {
            let id = id.as_ref();
            match id_to_idx.get(id) {
                Some(&idx) => haploid[idx] = is_haploid,
                None => {
                    tracing::warn!(sample = %id, "sex map ID not in input samples");
                    unmatched.push(id.to_string());
                }
            }
        }

        (Self::from(haploid), unmatched)
    }

    pub fn from_sex_map(
        sample_ids: &[String],
        entries: &[SexMapEntry],
        haploid_code: &str,
    ) -> (Self, Vec<String>) {
        Self::from_table(
            sample_ids,
            entries
                .iter()
                .map(|entry| (entry.sample_id.as_str(), entry.is_haploid(haploid_code))),
        )
    }

    pub fn len(&self) -> usize {
        self.haploid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.haploid.is_empty()
    }

    pub fn is_haploid(&self, sample: usize) -> bool {
        self.haploid.get(sample).copied().unwrap_or(false)
    }

    pub fn haploid_count(&self) -> usize {
        self.haploid_count
    }

    /// True when every sample is haploid, including the degenerate
    /// zero-sample case.
    pub fn is_all_haploid(&self) -> bool {
        self.haploid_count == self.haploid.len()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.haploid
    }

    /// Indices of haploid-designated samples in ascending order.
    pub fn haploid_samples(&self) -> impl Iterator<Item = usize> + '_ {
        self.haploid
            .iter()
            .enumerate()
            .filter_map(|(idx, &haploid)| haploid.then_some(idx))
    }
}

impl From<Vec<bool>> for PloidyMap {
    fn from(haploid: Vec<bool>) -> Self {
        let haploid_count = haploid.iter().filter(|&&h| h).count();
        Self {
            haploid,
            haploid_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unmapped_samples_default_to_diploid() {
        let samples = ids(&["A", "B", "C"]);
        let (map, unmatched) = PloidyMap::from_table(&samples, [("B", true)]);
        assert_eq!(map.as_slice(), &[false, true, false]);
        assert_eq!(map.haploid_count(), 1);
        assert!(unmatched.is_empty());
    }

    #[test]
    fn unknown_identifier_is_inert() {
        let samples = ids(&["A", "B"]);
        let (map, unmatched) = PloidyMap::from_table(&samples, [("Z", true), ("A", true)]);
        assert_eq!(map.as_slice(), &[true, false]);
        assert_eq!(unmatched, vec![String::from("Z")]);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn unknown_identifier_is_logged_as_warning() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .without_time()
            .finish();

        let samples = ids(&["A", "B"]);
        let (map, _) = tracing::subscriber::with_default(subscriber, || {
            PloidyMap::from_table(&samples, [("NOT_A_SAMPLE", true), ("B", true)])
        });
        assert_eq!(map.as_slice(), &[false, true]);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let warnings: Vec<&str> = output.lines().filter(|l| l.contains("WARN")).collect();
        assert_eq!(warnings.len(), 1, "{output}");
        assert!(warnings[0].contains("sex map ID not in input samples"));
        assert!(warnings[0].contains("sample=NOT_A_SAMPLE"));
    }

    #[test]
    fn later_entry_wins() {
        let samples = ids(&["A"]);
        let (map, _) = PloidyMap::from_table(&samples, [("A", true), ("A", false)]);
        assert_eq!(map.haploid_count(), 0);
    }

    #[test]
    fn sex_map_codes_select_haploid_samples() {
        let samples = ids(&["M1", "F1", "M2"]);
        let entries = vec![
            SexMapEntry {
                sample_id: "M1".into(),
                code: "1".into(),
            },
            SexMapEntry {
                sample_id: "F1".into(),
                code: "2".into(),
            },
            SexMapEntry {
                sample_id: "M2".into(),
                code: "1".into(),
            },
        ];
        let (map, _) = PloidyMap::from_sex_map(&samples, &entries, "1");
        assert_eq!(map.haploid_samples().collect::<Vec<_>>(), vec![0, 2]);
        assert!(!map.is_all_haploid());
    }

    #[test]
    fn empty_table_and_empty_samples() {
        let (map, unmatched) = PloidyMap::from_table::<_, &str>(&[], []);
        assert!(map.is_empty());
        assert!(map.is_all_haploid());
        assert!(unmatched.is_empty());

        assert!(PloidyMap::all_haploid(3).is_all_haploid());
        assert_eq!(PloidyMap::diploid(3).haploid_count(), 0);
    }
}
