//! Element-set loading and parsing.
//!
//! Fetches raw two-line element text from CelesTrak with a bundled local
//! fallback, and parses it into fixed-stride three-line records. The parser
//! is tolerant: malformed triples and truncated trailing groups are dropped,
//! never errored.

use std::fmt;

/// One parsed three-line element-set record. Immutable once parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementSetRecord {
    pub name: String,
    pub catalog_id: String,
    pub line1: String,
    pub line2: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TleSource {
    Primary,
    Fallback,
}

impl fmt::Display for TleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TleSource::Primary => write!(f, "CelesTrak"),
            TleSource::Fallback => write!(f, "local fallback"),
        }
    }
}

/// Whole-source failures surfaced to the user. Per-record problems never
/// reach this level.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadFailure {
    /// Both the primary and the fallback source failed.
    DataUnavailable(String),
    /// A source was fetched but parsed to zero valid records.
    EmptyDataset { source: TleSource },
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadFailure::DataUnavailable(detail) => write!(
                f,
                "Cannot load TLE data ({detail}). Add assets/tle_fallback.txt and reload."
            ),
            LoadFailure::EmptyDataset { source } => {
                write!(f, "TLE parsed empty from {source}.")
            }
        }
    }
}

/// Parses element-set text into at most `limit` records.
///
/// Lines are trimmed and empties dropped; records are taken in consecutive
/// triples (name, line 1, line 2). A triple is accepted only when the data
/// lines carry their leading markers. Truncated trailing groups fall off the
/// loop bound.
pub fn parse_element_sets(text: &str, limit: usize) -> Vec<ElementSetRecord> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut out = Vec::new();
    let mut i = 0;
    while i + 2 < lines.len() && out.len() < limit {
        let name = lines[i];
        let line1 = lines[i + 1];
        let line2 = lines[i + 2];
        i += 3;
        if !line1.starts_with("1 ") || !line2.starts_with("2 ") {
            continue;
        }
        // Corrupt multibyte text can land a non-boundary in the id columns;
        // such a triple is dropped like any other malformed record.
        let Some(raw_id) = line1.get(2..7.min(line1.len())) else {
            continue;
        };
        let catalog_id = raw_id.trim().to_string();
        out.push(ElementSetRecord {
            name: name.to_string(),
            catalog_id,
            line1: line1.to_string(),
            line2: line2.to_string(),
        });
    }
    out
}

#[cfg(not(target_arch = "wasm32"))]
fn fetch_text(url: &str) -> Result<String, String> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| format!("HTTP error: {}", e))?;
    response
        .into_string()
        .map_err(|e| format!("Read error: {}", e))
}

/// Two-source load chain: primary network source, then the bundled fallback
/// file. No retries beyond that. Reports which source produced the text.
#[cfg(not(target_arch = "wasm32"))]
pub fn load_element_sets(
    primary_url: &str,
    fallback_path: &str,
) -> Result<(String, TleSource), LoadFailure> {
    let primary_err = match fetch_text(primary_url) {
        Ok(text) => return Ok((text, TleSource::Primary)),
        Err(e) => e,
    };
    log::warn!("primary TLE source failed: {}", primary_err);
    match std::fs::read_to_string(fallback_path) {
        Ok(text) => Ok((text, TleSource::Fallback)),
        Err(e) => Err(LoadFailure::DataUnavailable(format!(
            "primary: {}; fallback: {}",
            primary_err, e
        ))),
    }
}

#[cfg(target_arch = "wasm32")]
thread_local! {
    pub(crate) static TLE_LOAD_RESULT:
        std::cell::RefCell<Option<Result<(String, TleSource), LoadFailure>>> =
        const { std::cell::RefCell::new(None) };
}

#[cfg(target_arch = "wasm32")]
pub(crate) async fn fetch_text_async(url: &str) -> Result<String, String> {
    use wasm_bindgen::JsCast as _;
    use web_sys::{Request, RequestInit, Response};

    let opts = RequestInit::new();
    opts.set_method("GET");

    let request =
        Request::new_with_str_and_init(url, &opts).map_err(|e| format!("{:?}", e))?;

    let window = web_sys::window().ok_or("No window")?;
    let resp_value =
        wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| format!("Fetch failed: {:?}", e))?;

    let resp: Response = resp_value
        .dyn_into()
        .map_err(|_| "Response is not a Response")?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    let array_buffer = wasm_bindgen_futures::JsFuture::from(
        resp.array_buffer().map_err(|e| format!("{:?}", e))?,
    )
    .await
    .map_err(|e| format!("{:?}", e))?;

    let bytes = js_sys::Uint8Array::new(&array_buffer).to_vec();
    String::from_utf8(bytes).map_err(|e| format!("{}", e))
}

#[cfg(target_arch = "wasm32")]
pub(crate) async fn load_element_sets_async(
    primary_url: &str,
    fallback_url: &str,
) -> Result<(String, TleSource), LoadFailure> {
    let primary_err = match fetch_text_async(primary_url).await {
        Ok(text) => return Ok((text, TleSource::Primary)),
        Err(e) => e,
    };
    log::warn!("primary TLE source failed: {}", primary_err);
    match fetch_text_async(fallback_url).await {
        Ok(text) => Ok((text, TleSource::Fallback)),
        Err(e) => Err(LoadFailure::DataUnavailable(format!(
            "primary: {}; fallback: {}",
            primary_err, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS_NAME: &str = "ISS (ZARYA)";
    const ISS_L1: &str =
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_L2: &str =
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    fn triple(name: &str, l1: &str, l2: &str) -> String {
        format!("{}\n{}\n{}\n", name, l1, l2)
    }

    #[test]
    fn parse_preserves_data_lines_exactly() {
        let text = triple(ISS_NAME, ISS_L1, ISS_L2);
        let records = parse_element_sets(&text, 10);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, ISS_NAME);
        assert_eq!(records[0].catalog_id, "25544");
        assert_eq!(records[0].line1, ISS_L1);
        assert_eq!(records[0].line2, ISS_L2);
    }

    #[test]
    fn parse_caps_at_limit_in_order() {
        let mut text = String::new();
        for i in 0..8 {
            text.push_str(&triple(&format!("SAT-{}", i), ISS_L1, ISS_L2));
        }
        let records = parse_element_sets(&text, 5);
        assert_eq!(records.len(), 5);
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.name, format!("SAT-{}", i));
        }
    }

    #[test]
    fn parse_drops_trailing_incomplete_group() {
        let mut text = triple(ISS_NAME, ISS_L1, ISS_L2);
        text.push_str("NOAA 18\n1 28654U 05018A   20098.54037539\n");
        let records = parse_element_sets(&text, 10);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, ISS_NAME);
    }

    #[test]
    fn multibyte_garbage_in_id_columns_is_dropped() {
        // Markers pass but byte 7 of line 1 falls inside a multibyte char.
        let mut text =
            String::from("BAD SAT\n1 \u{413}\u{413}\u{413} corrupted\n2 25544  51.6416\n");
        text.push_str(&triple(ISS_NAME, ISS_L1, ISS_L2));
        let records = parse_element_sets(&text, 10);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, ISS_NAME);
    }

    #[test]
    fn parse_skips_triple_with_bad_markers() {
        let mut text = triple("BROKEN", "X not a line one", "2 25544  51.6416");
        text.push_str(&triple(ISS_NAME, ISS_L1, ISS_L2));
        let records = parse_element_sets(&text, 10);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, ISS_NAME);
    }

    #[test]
    fn parse_empty_input_is_not_an_error() {
        assert!(parse_element_sets("", 10).is_empty());
        assert!(parse_element_sets("\n  \n\n", 10).is_empty());
    }

    #[test]
    fn two_triples_and_a_trailer() {
        let mut text = triple(ISS_NAME, ISS_L1, ISS_L2);
        text.push_str(&triple("SECOND", ISS_L1, ISS_L2));
        text.push_str("DANGLING NAME LINE\n");
        let records = parse_element_sets(&text, 10);
        assert_eq!(records.len(), 2);
        for r in &records {
            assert!(r.line1.starts_with("1 "));
            assert!(r.line2.starts_with("2 "));
        }
    }

    #[test]
    fn empty_dataset_message_names_the_source() {
        let msg = LoadFailure::EmptyDataset {
            source: TleSource::Fallback,
        }
        .to_string();
        assert!(msg.contains("local fallback"));
        let unavailable = LoadFailure::DataUnavailable("offline".to_string()).to_string();
        assert_ne!(msg, unavailable);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn fallback_text_is_returned_unchanged() {
        // Unreachable primary on a reserved port, bundled file as fallback.
        let result = load_element_sets(
            "http://127.0.0.1:9/unreachable",
            "assets/tle_fallback.txt",
        );
        let (text, source) = result.expect("fallback should succeed");
        assert_eq!(source, TleSource::Fallback);
        assert_eq!(
            text,
            std::fs::read_to_string("assets/tle_fallback.txt").unwrap()
        );
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn both_sources_failing_is_data_unavailable() {
        let result = load_element_sets(
            "http://127.0.0.1:9/unreachable",
            "assets/no_such_file.txt",
        );
        assert!(matches!(result, Err(LoadFailure::DataUnavailable(_))));
    }
}
