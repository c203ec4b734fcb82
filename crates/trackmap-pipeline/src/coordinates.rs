//! KML coordinate extraction and parsing.
//!
//! A KML track stores its outline as the text of a `coordinates`
//! element: whitespace-separated tokens of the form
//! `longitude,latitude[,altitude]`.  Only the first two fields of each
//! token are used.
//!
//! This is step 1 of the pipeline.

use crate::types::{GeoPoint, TrackError};

/// Local name of the KML element holding the coordinate list.
const COORDINATES_TAG: &str = "coordinates";

/// Return the trimmed text of the first `coordinates` element in a KML
/// document.
///
/// The element is matched by local name, so the KML namespace (or its
/// absence) does not matter.
///
/// # Errors
///
/// Returns [`TrackError::Xml`] if the document is not well-formed XML.
/// Returns [`TrackError::MissingCoordinates`] if there is no
/// `coordinates` element or it has no text content.
pub fn extract_coordinates_text(kml: &str) -> Result<String, TrackError> {
    let document = roxmltree::Document::parse(kml)?;
    let node = document
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == COORDINATES_TAG)
        .ok_or(TrackError::MissingCoordinates)?;
    if !node.has_children() {
        return Err(TrackError::MissingCoordinates);
    }

    // Concatenate every text child so comments or CDATA splits do not
    // truncate the list.
    let text: String = node
        .children()
        .filter(roxmltree::Node::is_text)
        .filter_map(|n| n.text())
        .collect();
    Ok(text.trim().to_string())
}

/// Parse a whitespace-separated coordinate list into points.
///
/// Each token's first field becomes [`GeoPoint::latitude`] and its
/// second field [`GeoPoint::longitude`].  A third (altitude) field and
/// anything after it is ignored.
///
/// # Errors
///
/// Returns [`TrackError::EmptyCoordinates`] if `text` holds no tokens.
/// Returns [`TrackError::InvalidToken`] for a token with fewer than two
/// fields or a field that is not a finite number.
pub fn parse_coordinates(text: &str) -> Result<Vec<GeoPoint>, TrackError> {
    let points = text
        .split_whitespace()
        .enumerate()
        .map(|(index, token)| parse_token(index, token))
        .collect::<Result<Vec<_>, _>>()?;

    if points.is_empty() {
        return Err(TrackError::EmptyCoordinates);
    }
    Ok(points)
}

/// Parse one `a,b[,alt]` token.
fn parse_token(index: usize, token: &str) -> Result<GeoPoint, TrackError> {
    let invalid = |reason: String| TrackError::InvalidToken {
        index,
        token: token.to_string(),
        reason,
    };

    let mut fields = token.split(',');
    let (Some(first), Some(second)) = (fields.next(), fields.next()) else {
        return Err(invalid("expected at least two comma-separated fields".to_string()));
    };

    let parse_field = |field: &str| -> Result<f64, TrackError> {
        let value: f64 = field
            .trim()
            .parse()
            .map_err(|e| invalid(format!("'{field}' is not a number: {e}")))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(format!("'{field}' is not finite")))
        }
    };

    Ok(GeoPoint::new(parse_field(first)?, parse_field(second)?))
}
