//! Quake II map table
//!
//! Campaign maps followed by The Reckoning (units 11-15) and Ground Zero
//! (units 16-20). Order matches the order maps are played in.

/// A map and the unit it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapInfo {
    pub name: &'static str,
    pub unit: u32,
    pub secret: bool,
}

const fn map(name: &'static str, unit: u32) -> MapInfo {
    MapInfo {
        name,
        unit,
        secret: false,
    }
}

const fn secret(name: &'static str, unit: u32) -> MapInfo {
    MapInfo {
        name,
        unit,
        secret: true,
    }
}

/// Every known map, in play order
pub const MAPS: &[MapInfo] = &[
    map("base1", 1),
    map("base2", 1),
    map("base3", 1),
    secret("train", 1),
    map("bunk1", 2),
    map("ware1", 2),
    map("ware2", 2),
    map("jail1", 3),
    map("jail2", 3),
    map("jail3", 3),
    map("jail4", 3),
    map("jail5", 3),
    map("security", 3),
    map("mintro", 4),
    map("mine1", 4),
    map("mine2", 4),
    map("mine3", 4),
    map("mine4", 4),
    map("fact1", 5),
    secret("fact3", 5),
    map("fact2", 5),
    map("power1", 6),
    map("power2", 6),
    map("cool1", 6),
    map("waste1", 6),
    map("waste2", 6),
    map("waste3", 6),
    map("biggun", 7),
    map("hangar1", 8),
    secret("space", 8),
    map("lab", 8),
    map("hangar2", 8),
    map("command", 8),
    map("strike", 8),
    map("city1", 9),
    map("city2", 9),
    map("city3", 9),
    map("boss1", 10),
    map("boss2", 10),
    map("xswamp", 11),
    map("xsewer1", 11),
    map("xsewer2", 11),
    map("xcompnd1", 12),
    map("xcompnd2", 12),
    map("xreactor", 12),
    map("xware", 12),
    map("xintell", 12),
    map("industry", 13),
    map("outbase", 13),
    map("w_treat", 13),
    map("badlands", 13),
    map("refinery", 13),
    map("xhangar1", 14),
    map("xhangar2", 14),
    map("xship", 14),
    map("xmoon1", 15),
    map("xmoon2", 15),
    map("rmine1", 16),
    secret("rmine2", 16),
    map("rlava1", 16),
    map("rlava2", 16),
    map("rware1", 17),
    map("rware2", 17),
    map("rbase1", 17),
    map("rbase2", 17),
    map("rhangar1", 18),
    map("rsewer1", 18),
    map("rsewer2", 18),
    map("rhangar2", 18),
    map("rammo1", 19),
    map("rammo2", 19),
    map("rboss", 20),
];

/// Look up a map by name
pub fn find_map(name: &str) -> Option<&'static MapInfo> {
    MAPS.iter().find(|m| m.name == name)
}
