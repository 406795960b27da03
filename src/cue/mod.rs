use crate::cue::directive::{
    is_file_directive, line_ranges, parse_file_directive, serialize_file_directive,
};
use crate::cue::error::{CueError, CueResult};
use crate::cue::models::FileDirective;
use crate::encoding::{self, DetectedEncoding, EncodingDetector};
use log::debug;
use std::path::{Path, PathBuf};
use tokio::fs;

pub mod directive;
pub mod error;
pub mod models;

/// A cue sheet on disk whose `FILE` reference can be read and rewritten.
pub struct CueSheetFile {
    cue_path: PathBuf,
}

impl CueSheetFile {
    pub fn new(cue_path: impl AsRef<Path>) -> Self {
        Self {
            cue_path: cue_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.cue_path
    }

    pub fn backup_path(&self) -> PathBuf {
        let mut backup = self.cue_path.clone().into_os_string();
        backup.push(".bak");
        PathBuf::from(backup)
    }

    /// Returns the audio filename of the first `FILE` directive, `None` when the
    /// sheet has none.
    pub async fn read_reference(
        &self,
        detector: &mut EncodingDetector,
    ) -> CueResult<Option<String>> {
        let data = fs::read(&self.cue_path).await?;
        let detected = detector.detect(&data);
        debug!("Reading {:?} as {}", self.cue_path, detected.name());

        let directive = self.find_file_directive(&data, detected)?;
        Ok(directive.map(|directive| directive.filename))
    }

    /// Points the first `FILE` directive at `filename` and returns the directive
    /// as it was before. Every other line is written back untouched.
    pub async fn write_reference(
        &self,
        filename: &str,
        backup: bool,
        detector: &mut EncodingDetector,
    ) -> CueResult<FileDirective> {
        if backup {
            let backup_path = self.backup_path();
            debug!("Backing up {:?} to {:?}", self.cue_path, backup_path);
            fs::copy(&self.cue_path, &backup_path).await?;
        }

        let data = fs::read(&self.cue_path).await?;
        let detected = detector.detect(&data);
        debug!("Rewriting {:?} as {}", self.cue_path, detected.name());

        let (previous, rewritten) = self
            .replace_reference(&data, detected, filename)?
            .ok_or_else(|| CueError::NoFileDirective(self.cue_path.clone()))?;

        fs::write(&self.cue_path, rewritten).await?;

        Ok(previous)
    }

    fn find_file_directive(
        &self,
        data: &[u8],
        detected: DetectedEncoding,
    ) -> CueResult<Option<FileDirective>> {
        let text = encoding::decode(detected.encoding, detected.body(data))
            .ok_or_else(|| self.undecodable(detected))?;

        line_ranges(text.as_bytes())
            .into_iter()
            .map(|range| &text[range])
            .find(|line| is_file_directive(line.as_bytes()))
            .map(parse_file_directive)
            .transpose()
    }

    fn replace_reference(
        &self,
        data: &[u8],
        detected: DetectedEncoding,
        filename: &str,
    ) -> CueResult<Option<(FileDirective, Vec<u8>)>> {
        if detected.is_ascii_compatible() {
            self.replace_reference_in_bytes(data, detected, filename)
        } else {
            self.replace_reference_in_text(data, detected, filename)
        }
    }

    /// Line surgery on raw bytes, untouched lines are never decoded.
    fn replace_reference_in_bytes(
        &self,
        data: &[u8],
        detected: DetectedEncoding,
        filename: &str,
    ) -> CueResult<Option<(FileDirective, Vec<u8>)>> {
        let body = detected.body(data);
        let mut output = Vec::with_capacity(data.len() + filename.len());
        output.extend_from_slice(detected.bom(data));

        let mut previous = None;
        for range in line_ranges(body) {
            let line = &body[range];

            if previous.is_some() || !is_file_directive(line) {
                output.extend_from_slice(line);
                continue;
            }

            let text = encoding::decode(detected.encoding, line)
                .ok_or_else(|| self.undecodable(detected))?;
            let directive = parse_file_directive(&text)?;
            let replaced = serialize_file_directive(&directive.with_filename(filename));
            let encoded = encoding::encode(detected.encoding, &replaced)
                .ok_or_else(|| self.unencodable(detected))?;

            output.extend_from_slice(&encoded);
            previous = Some(directive);
        }

        Ok(previous.map(|directive| (directive, output)))
    }

    /// Whole-text rewrite for encodings such as UTF-16 where ASCII bytes are not
    /// self-delimiting.
    fn replace_reference_in_text(
        &self,
        data: &[u8],
        detected: DetectedEncoding,
        filename: &str,
    ) -> CueResult<Option<(FileDirective, Vec<u8>)>> {
        let text = encoding::decode(detected.encoding, detected.body(data))
            .ok_or_else(|| self.undecodable(detected))?;
        let mut rewritten = String::with_capacity(text.len() + filename.len());

        let mut previous = None;
        for range in line_ranges(text.as_bytes()) {
            let line = &text[range];

            if previous.is_some() || !is_file_directive(line.as_bytes()) {
                rewritten.push_str(line);
                continue;
            }

            let directive = parse_file_directive(line)?;
            rewritten.push_str(&serialize_file_directive(&directive.with_filename(filename)));
            previous = Some(directive);
        }

        let Some(previous) = previous else {
            return Ok(None);
        };

        let mut output = detected.bom(data).to_vec();
        output.extend(
            encoding::encode(detected.encoding, &rewritten)
                .ok_or_else(|| self.unencodable(detected))?,
        );

        Ok(Some((previous, output)))
    }

    fn undecodable(&self, detected: DetectedEncoding) -> CueError {
        CueError::Undecodable {
            path: self.cue_path.clone(),
            encoding: detected.name(),
        }
    }

    fn unencodable(&self, detected: DetectedEncoding) -> CueError {
        CueError::Unencodable {
            path: self.cue_path.clone(),
            encoding: detected.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SHEET: &str = "REM GENRE Rock\r\n\
        PERFORMER \"The Beatles\"\r\n\
        TITLE \"Yellow Submarine\"\r\n\
        FILE \"The Beatles - Yellow Submarine.wav\" WAVE\r\n  \
        TRACK 01 AUDIO\r\n    \
        INDEX 01 00:00:00\r\n";

    fn lines(data: &[u8]) -> Vec<&[u8]> {
        line_ranges(data).into_iter().map(|r| &data[r]).collect()
    }

    async fn write_sheet(dir: &Path, name: &str, data: &[u8]) -> CueSheetFile {
        let path = dir.join(name);
        fs::write(&path, data).await.unwrap();
        CueSheetFile::new(path)
    }

    #[tokio::test]
    async fn reads_first_file_reference() {
        let dir = tempdir().unwrap();
        let data = format!("{SHEET}FILE \"second.wav\" WAVE\r\n");
        let sheet = write_sheet(dir.path(), "a.cue", data.as_bytes()).await;

        let reference = sheet
            .read_reference(&mut EncodingDetector::new())
            .await
            .unwrap();
        assert_eq!(
            reference.as_deref(),
            Some("The Beatles - Yellow Submarine.wav")
        );
    }

    #[tokio::test]
    async fn reads_nothing_without_file_directive() {
        let dir = tempdir().unwrap();
        let sheet = write_sheet(dir.path(), "notes.cue", b"just some notes\n").await;

        let reference = sheet
            .read_reference(&mut EncodingDetector::new())
            .await
            .unwrap();
        assert_eq!(reference, None);
    }

    #[tokio::test]
    async fn rewrite_only_touches_file_line() {
        let dir = tempdir().unwrap();
        let sheet = write_sheet(dir.path(), "a.cue", SHEET.as_bytes()).await;
        let mut detector = EncodingDetector::new();

        let previous = sheet
            .write_reference("The Beatles - Yellow Submarine.flac", false, &mut detector)
            .await
            .unwrap();
        assert_eq!(previous.filename, "The Beatles - Yellow Submarine.wav");

        let original = SHEET.as_bytes();
        let rewritten = fs::read(sheet.path()).await.unwrap();
        let before = lines(original);
        let after = lines(&rewritten);
        assert_eq!(before.len(), after.len());
        for (i, (old, new)) in before.iter().zip(after.iter()).enumerate() {
            if i == 3 {
                assert_eq!(
                    *new,
                    &b"FILE \"The Beatles - Yellow Submarine.flac\" WAVE\r\n"[..]
                );
            } else {
                assert_eq!(old, new);
            }
        }
        assert!(!sheet.backup_path().exists());
    }

    #[tokio::test]
    async fn rewrite_then_read_returns_new_reference() {
        let dir = tempdir().unwrap();
        let sheet = write_sheet(dir.path(), "a.cue", SHEET.as_bytes()).await;
        let mut detector = EncodingDetector::new();

        sheet
            .write_reference("Yellow Submarine.flac", true, &mut detector)
            .await
            .unwrap();

        let reference = sheet.read_reference(&mut detector).await.unwrap();
        assert_eq!(reference.as_deref(), Some("Yellow Submarine.flac"));
    }

    #[tokio::test]
    async fn backup_holds_original_bytes() {
        let dir = tempdir().unwrap();
        let sheet = write_sheet(dir.path(), "a.cue", SHEET.as_bytes()).await;

        sheet
            .write_reference("x.flac", true, &mut EncodingDetector::new())
            .await
            .unwrap();

        assert_eq!(sheet.backup_path(), dir.path().join("a.cue.bak"));
        let backup = fs::read(sheet.backup_path()).await.unwrap();
        assert_eq!(backup, SHEET.as_bytes());
    }

    #[tokio::test]
    async fn rewrite_without_file_directive_fails() {
        let dir = tempdir().unwrap();
        let sheet = write_sheet(dir.path(), "a.cue", b"TITLE \"x\"\n").await;

        let result = sheet
            .write_reference("x.flac", false, &mut EncodingDetector::new())
            .await;
        assert!(matches!(result, Err(CueError::NoFileDirective(_))));
        assert_eq!(fs::read(sheet.path()).await.unwrap(), b"TITLE \"x\"\n");
    }

    #[tokio::test]
    async fn keeps_windows_1252_bytes() {
        let dir = tempdir().unwrap();
        let data: &[u8] = b"REM COMMENT \"Encod\xE9 avec Exact Audio Copy\"\n\
            PERFORMER \"Beyonc\xE9 et les Fr\xE8res Jacques\"\n\
            TITLE \"D\xE9j\xE0 vu, caf\xE9 cr\xE8me et cr\xEApes\"\n\
            FILE \"D\xE9j\xE0 Vu.wav\" WAVE\n\
            TRACK 01 AUDIO\n";
        let sheet = write_sheet(dir.path(), "a.cue", data).await;
        let mut detector = EncodingDetector::new();

        let reference = sheet.read_reference(&mut detector).await.unwrap().unwrap();
        let replacement = reference.replace(".wav", ".flac");
        sheet
            .write_reference(&replacement, false, &mut detector)
            .await
            .unwrap();

        let rewritten = fs::read(sheet.path()).await.unwrap();
        let before = lines(data);
        let after = lines(&rewritten);
        assert_eq!(before[..3], after[..3]);
        assert_eq!(after[3], &b"FILE \"D\xE9j\xE0 Vu.flac\" WAVE\n"[..]);
        assert_eq!(before[4], after[4]);
    }

    #[tokio::test]
    async fn keeps_shift_jis_bytes() {
        let dir = tempdir().unwrap();
        let text = "REM COMMENT \"ExactAudioCopy で取り込み\"\n\
            PERFORMER \"宇多田ヒカル\"\n\
            TITLE \"ファースト・ラヴ\"\n\
            FILE \"ファースト・ラヴ.wav\" WAVE\n\
            TRACK 01 AUDIO\n\
            TITLE \"オートマティック\"\n";
        let (data, _, _) = encoding_rs::SHIFT_JIS.encode(text);
        let sheet = write_sheet(dir.path(), "a.cue", &data).await;
        let mut detector = EncodingDetector::new();

        let reference = sheet.read_reference(&mut detector).await.unwrap().unwrap();
        let replacement = reference.replace(".wav", ".flac");
        sheet
            .write_reference(&replacement, false, &mut detector)
            .await
            .unwrap();

        let expected = text.replace("ラヴ.wav", "ラヴ.flac");
        let (expected, _, _) = encoding_rs::SHIFT_JIS.encode(&expected);
        assert_eq!(fs::read(sheet.path()).await.unwrap(), &*expected);
    }

    #[tokio::test]
    async fn keeps_utf16_bom_and_encoding() {
        let dir = tempdir().unwrap();
        let text = "TITLE \"Ys\"\r\nFILE \"Ys.wav\" WAVE\r\n";
        let mut data = vec![0xFF, 0xFE];
        data.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        let sheet = write_sheet(dir.path(), "a.cue", &data).await;
        let mut detector = EncodingDetector::new();

        sheet
            .write_reference("Ys.flac", false, &mut detector)
            .await
            .unwrap();

        let mut expected = vec![0xFF, 0xFE];
        expected.extend(
            "TITLE \"Ys\"\r\nFILE \"Ys.flac\" WAVE\r\n"
                .encode_utf16()
                .flat_map(u16::to_le_bytes),
        );
        assert_eq!(fs::read(sheet.path()).await.unwrap(), expected);
        assert_eq!(
            sheet.read_reference(&mut detector).await.unwrap().as_deref(),
            Some("Ys.flac")
        );
    }

    #[tokio::test]
    async fn malformed_directive_is_reported() {
        let dir = tempdir().unwrap();
        let sheet = write_sheet(dir.path(), "a.cue", b"FILE \"broken.wav WAVE\n").await;

        let result = sheet.read_reference(&mut EncodingDetector::new()).await;
        assert!(matches!(result, Err(CueError::MalformedFileDirective(_))));
    }
}
