//! Static airport table and nearest-airport resolution.

use serde::Serialize;

use crate::spatial::haversine_distance;

/// A known airport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Airport {
    pub icao: &'static str,
    /// IATA code when available, otherwise a short local abbreviation
    pub code: &'static str,
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

const fn airport(icao: &'static str, code: &'static str, name: &'static str, lat: f64, lon: f64) -> Airport {
    Airport { icao, code, name, lat, lon }
}

/// Airports in the fleet's operating region.
pub const AIRPORTS: &[Airport] = &[
    // Buenos Aires metropolitan area
    airport("SAEZ", "EZE", "Ezeiza Ministro Pistarini", -34.8222, -58.5358),
    airport("SABE", "AEP", "Aeroparque Jorge Newbery", -34.5592, -58.4156),
    airport("SADF", "SFD", "San Fernando", -34.4532, -58.5896),
    airport("SADP", "EPA", "El Palomar", -34.6099, -58.6126),
    airport("SAAF", "MOR", "Morón", -34.6764, -58.6428),
    // Buenos Aires province
    airport("SAZM", "MDQ", "Mar del Plata", -37.9342, -57.5733),
    airport("SAZB", "BHI", "Bahía Blanca", -38.7250, -62.1693),
    airport("SAAT", "TDL", "Tandil", -37.2373, -59.2279),
    airport("SAZV", "VLG", "Villa Gesell", -37.2354, -56.9563),
    // Litoral and interior
    airport("SAAR", "ROS", "Rosario Islas Malvinas", -32.9036, -60.7850),
    airport("SAAP", "PRA", "Paraná", -31.7948, -60.4804),
    airport("SACO", "COR", "Córdoba Ambrosio Taravella", -31.3236, -64.2080),
    airport("SAME", "MDZ", "Mendoza El Plumerillo", -32.8317, -68.7929),
    airport("SAZS", "BRC", "San Carlos de Bariloche", -41.1512, -71.1578),
    airport("SARI", "IGR", "Cataratas del Iguazú", -25.7373, -54.4734),
    // Neighbouring countries
    airport("SUMU", "MVD", "Montevideo Carrasco", -34.8384, -56.0308),
    airport("SULS", "PDP", "Punta del Este", -34.8551, -55.0943),
    airport("SGAS", "ASU", "Asunción Silvio Pettirossi", -25.2400, -57.5190),
    airport("SCEL", "SCL", "Santiago Arturo Merino Benítez", -33.3930, -70.7858),
    airport("SBGR", "GRU", "São Paulo Guarulhos", -23.4356, -46.4731),
];

/// Nearest known airport within `radius_km` of the given point.
pub fn nearest_airport(lat: f64, lon: f64, radius_km: f64) -> Option<&'static Airport> {
    let radius_m = radius_km * 1000.0;
    AIRPORTS
        .iter()
        .map(|airport| (airport, haversine_distance(lat, lon, airport.lat, airport.lon)))
        .filter(|(_, distance)| *distance <= radius_m)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(airport, _)| airport)
}

/// Look up an airport by display or ICAO code.
pub fn by_code(code: &str) -> Option<&'static Airport> {
    AIRPORTS
        .iter()
        .find(|airport| airport.code.eq_ignore_ascii_case(code) || airport.icao.eq_ignore_ascii_case(code))
}
