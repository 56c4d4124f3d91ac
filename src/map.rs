//! Static sector map: convex polygon regions joined by portal edges.
//!
//! The map is loaded and validated once at startup and never mutated. Walls
//! are consecutive vertex pairs of a sector's closed boundary loop; a wall
//! listed in `portal_walls` opens into the neighbour at the same position in
//! `neighbour_ids`.

use glam::Vec2;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::math::point_in_polygon;

pub type SectorId = usize;

#[derive(Debug)]
pub struct Sector {
    pub id: SectorId,
    /// Closed boundary loop, first vertex repeated as the last.
    pub vertices: Vec<Vec2>,
    pub ceiling_z: f32,
    pub floor_z: f32,
    pub neighbour_ids: Vec<SectorId>,
    pub portal_walls: Vec<usize>,
}

impl Sector {
    pub fn wall_count(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    pub fn wall(&self, index: usize) -> (Vec2, Vec2) {
        (self.vertices[index], self.vertices[index + 1])
    }

    /// The sector on the other side of a wall, or `None` for a solid wall.
    pub fn neighbour_across(&self, wall_index: usize) -> Option<SectorId> {
        self.portal_walls
            .iter()
            .position(|&w| w == wall_index)
            .map(|i| self.neighbour_ids[i])
    }
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse map file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("map has no sectors")]
    Empty,
    #[error("sector ids must be dense and in order, found {0}")]
    NonDenseId(SectorId),
    #[error("sector {0}: boundary loop needs at least four vertices")]
    DegenerateLoop(SectorId),
    #[error("sector {0}: boundary loop is not closed")]
    OpenLoop(SectorId),
    #[error("sector {sector}: {portals} portal walls but {neighbours} neighbour ids")]
    PortalNeighbourMismatch {
        sector: SectorId,
        portals: usize,
        neighbours: usize,
    },
    #[error("sector {sector}: portal wall index {wall} is out of range")]
    PortalWallOutOfRange { sector: SectorId, wall: usize },
    #[error("sector {sector}: neighbour id {neighbour} does not exist")]
    UnknownNeighbour {
        sector: SectorId,
        neighbour: SectorId,
    },
}

/// On-disk sector description. Kept separate from the runtime type so the
/// geometry crate types never need serde impls.
#[derive(Deserialize)]
struct SectorDef {
    id: usize,
    vertices: Vec<[f32; 2]>,
    ceiling_z: f32,
    floor_z: f32,
    #[serde(default)]
    neighbour_ids: Vec<usize>,
    #[serde(default)]
    portal_walls: Vec<usize>,
}

#[derive(Deserialize)]
struct MapDef {
    sectors: Vec<SectorDef>,
}

impl From<SectorDef> for Sector {
    fn from(def: SectorDef) -> Self {
        Sector {
            id: def.id,
            vertices: def
                .vertices
                .into_iter()
                .map(|[x, y]| Vec2::new(x, y))
                .collect(),
            ceiling_z: def.ceiling_z,
            floor_z: def.floor_z,
            neighbour_ids: def.neighbour_ids,
            portal_walls: def.portal_walls,
        }
    }
}

#[derive(Debug)]
pub struct Map {
    sectors: Vec<Sector>,
}

impl Map {
    /// Build a map from sectors, enforcing the load-time invariants.
    pub fn from_sectors(sectors: Vec<Sector>) -> Result<Map, MapError> {
        let map = Map { sectors };
        map.validate()?;
        Ok(map)
    }

    pub fn load(path: &Path) -> Result<Map, MapError> {
        let text = std::fs::read_to_string(path)?;
        Map::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Map, MapError> {
        let def: MapDef = toml::from_str(text)?;
        Map::from_sectors(def.sectors.into_iter().map(Sector::from).collect())
    }

    fn validate(&self) -> Result<(), MapError> {
        if self.sectors.is_empty() {
            return Err(MapError::Empty);
        }
        for (index, sector) in self.sectors.iter().enumerate() {
            if sector.id != index {
                return Err(MapError::NonDenseId(sector.id));
            }
            if sector.vertices.len() < 4 {
                return Err(MapError::DegenerateLoop(sector.id));
            }
            if sector.vertices.first() != sector.vertices.last() {
                return Err(MapError::OpenLoop(sector.id));
            }
            if sector.neighbour_ids.len() != sector.portal_walls.len() {
                return Err(MapError::PortalNeighbourMismatch {
                    sector: sector.id,
                    portals: sector.portal_walls.len(),
                    neighbours: sector.neighbour_ids.len(),
                });
            }
            for &wall in &sector.portal_walls {
                if wall >= sector.wall_count() {
                    return Err(MapError::PortalWallOutOfRange {
                        sector: sector.id,
                        wall,
                    });
                }
            }
            for &neighbour in &sector.neighbour_ids {
                if neighbour >= self.sectors.len() {
                    return Err(MapError::UnknownNeighbour {
                        sector: sector.id,
                        neighbour,
                    });
                }
            }
        }
        Ok(())
    }

    /// Ids are dense and validated at load, so indexing cannot fail on a
    /// validated map.
    pub fn sector(&self, id: SectorId) -> &Sector {
        &self.sectors[id]
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// The sector whose boundary contains `point`, if any.
    pub fn sector_containing(&self, point: Vec2) -> Option<&Sector> {
        self.sectors
            .iter()
            .find(|s| point_in_polygon(&s.vertices, point))
    }

    /// The built-in four-room layout used when no map file is given.
    pub fn default_map() -> Map {
        let sectors = vec![
            Sector {
                id: 0,
                vertices: vec![
                    Vec2::new(-20.6038271383113, 15.242158914828),
                    Vec2::new(-26.5464397239003, -0.2086338077036),
                    Vec2::new(-18.0286950178894, -19.4230811677749),
                    Vec2::new(16.0422838061545, -13.2823814959995),
                    Vec2::new(20.4001997022531, 14.6478976562691),
                    Vec2::new(2.9685361178586, 22.1752069313485),
                    Vec2::new(-12.0860824323003, 52.2844440316665),
                    Vec2::new(-20.6038271383113, 15.242158914828),
                ],
                ceiling_z: 8.0,
                floor_z: 0.0,
                neighbour_ids: vec![1, 3],
                portal_walls: vec![0, 3],
            },
            Sector {
                id: 1,
                vertices: vec![
                    Vec2::new(-20.6038271383113, 15.242158914828),
                    Vec2::new(-65.0, 35.0),
                    Vec2::new(-65.0, 10.0),
                    Vec2::new(-26.5464397239003, -0.2086338077036),
                    Vec2::new(-20.6038271383113, 15.242158914828),
                ],
                ceiling_z: 7.0,
                floor_z: -5.0,
                neighbour_ids: vec![2, 0],
                portal_walls: vec![1, 3],
            },
            Sector {
                id: 2,
                vertices: vec![
                    Vec2::new(-65.0, 35.0),
                    Vec2::new(-100.0, 30.0),
                    Vec2::new(-100.0, 20.0),
                    Vec2::new(-120.0, 10.0),
                    Vec2::new(-65.0, 10.0),
                    Vec2::new(-65.0, 35.0),
                ],
                ceiling_z: 7.0,
                floor_z: -1.0,
                neighbour_ids: vec![1],
                portal_walls: vec![4],
            },
            Sector {
                id: 3,
                vertices: vec![
                    Vec2::new(16.0422838061545, -13.2823814959995),
                    Vec2::new(90.0, -10.0),
                    Vec2::new(90.0, 10.0),
                    Vec2::new(20.4001997022531, 14.6478976562691),
                    Vec2::new(16.0422838061545, -13.2823814959995),
                ],
                ceiling_z: 20.0,
                floor_z: -10.0,
                neighbour_ids: vec![0],
                portal_walls: vec![3],
            },
        ];
        Map::from_sectors(sectors).expect("built-in map is valid")
    }
}
