use crate::console::Console;
use crate::error::ProviderError;
use crate::position::RegionPosition;
use crate::region::RegionContainer;
use log::debug;
use std::fs::{self, read_dir};
use std::path::Path;
use std::str::FromStr;

pub trait RegionProvider {
    fn get_region(&self, position: RegionPosition) -> Result<RegionContainer, ProviderError>;

    fn save_region(
        &self,
        position: RegionPosition,
        region: &mut RegionContainer,
    ) -> Result<(), ProviderError>;
}

/// Loads and saves region containers as `r.{x}.{z}.mcr` files in one
/// save folder.
pub struct FolderRegionProvider<'a> {
    /// Folder where region files are located.
    folder_path: &'a Path,
    /// Platform whose conventions the files follow.
    console: Console,
}

impl<'a> FolderRegionProvider<'a> {
    pub fn new(folder: &'a str, console: Console) -> FolderRegionProvider<'a> {
        let folder_path = Path::new(folder);

        FolderRegionProvider {
            folder_path,
            console,
        }
    }

    /// Lists the positions of every region file in the folder.
    pub fn iter_positions(&self) -> Result<impl Iterator<Item = RegionPosition>, ProviderError> {
        let positions: Vec<_> = read_dir(self.folder_path)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| region_position_from_filename(&entry.path()))
            .collect();

        Ok(positions.into_iter())
    }
}

impl<'a> RegionProvider for FolderRegionProvider<'a> {
    fn get_region(&self, position: RegionPosition) -> Result<RegionContainer, ProviderError> {
        let region_name = region_position_filename(position);
        let region_path = self.folder_path.join(region_name);

        // A region that was never saved reads back empty.
        if !region_path.exists() {
            return Ok(RegionContainer::new(self.console));
        }

        let bytes = fs::read(region_path)?;
        let region = RegionContainer::read(self.console, &bytes)?;

        Ok(region)
    }

    fn save_region(
        &self,
        position: RegionPosition,
        region: &mut RegionContainer,
    ) -> Result<(), ProviderError> {
        if !self.folder_path.exists() {
            fs::create_dir_all(self.folder_path)?;
        }

        // Serialize fully before touching the file, a failed write must
        // not leave a truncated container behind.
        let bytes = region.write(self.console)?;

        let region_name = region_position_filename(position);
        let region_path = self.folder_path.join(region_name);

        debug!(
            target: "lce-region",
            "Saving region x: {}, z: {} ({} bytes)",
            position.x,
            position.z,
            bytes.len()
        );

        fs::write(region_path, bytes)?;

        Ok(())
    }
}

fn region_position_from_filename(path: &Path) -> Option<RegionPosition> {
    // Lossy is fine, anything mangled fails the format check below.
    let filename = path.file_name().unwrap_or_default().to_string_lossy();
    let parts: Vec<_> = filename.split('.').collect();

    let incorrect_format = parts.len() != 4 || parts[0] != "r" || parts[3] != "mcr";

    if incorrect_format {
        return None;
    }

    let x = i32::from_str(parts[1]).ok()?;
    let z = i32::from_str(parts[2]).ok()?;

    Some(RegionPosition::new(x, z))
}

fn region_position_filename(position: RegionPosition) -> String {
    format!("r.{}.{}.mcr", position.x, position.z)
}
