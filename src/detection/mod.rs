pub mod preprocessing;
pub mod contours;
pub mod glyphs;
pub mod card;
pub mod groups;
pub mod classify;
pub mod assemble;

use image::DynamicImage;
use crate::config::ScanConfig;
use crate::error::Result;
use crate::models::{Assembly, Roi};
use crate::pipeline::{NoopObserver, StageObserver};

use card::CardLocator;
use classify::DigitClassifier;
use glyphs::GlyphLibrary;
use groups::GroupLocator;

/// Main detection pipeline orchestrator
///
/// Holds the configuration and the glyph library, both read-only once
/// built, so one scanner can serve any number of frames or threads.
pub struct CardScanner {
    config: ScanConfig,
    library: GlyphLibrary,
}

impl CardScanner {
    /// Validate the configuration and build the glyph library from
    /// `config.reference_path`.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let library = GlyphLibrary::load(&config.reference_path, &config)?;
        Ok(Self { config, library })
    }

    pub fn with_library(config: ScanConfig, library: GlyphLibrary) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, library })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn library(&self) -> &GlyphLibrary {
        &self.library
    }

    /// Find the card outline in a raw frame.
    pub fn locate_card(&self, frame: &DynamicImage) -> Option<Roi> {
        self.locate_card_observed(frame, &mut NoopObserver)
    }

    pub fn locate_card_observed(&self, frame: &DynamicImage, observer: &mut dyn StageObserver) -> Option<Roi> {
        CardLocator::new(self.config.card.clone()).locate(frame, observer)
    }

    /// Read the number from an image already cropped to the card.
    pub fn read_card(&self, card_region: &DynamicImage) -> Assembly {
        self.read_card_observed(card_region, &mut NoopObserver)
    }

    pub fn read_card_observed(&self, card_region: &DynamicImage, observer: &mut dyn StageObserver) -> Assembly {
        let located = GroupLocator::new(self.config.groups.clone()).locate_groups(card_region, observer);
        if located.groups.is_empty() {
            log::debug!("No digit groups in card region");
            return Assembly::NotFound;
        }

        let classifier = DigitClassifier::new(
            &self.library,
            self.config.classifier.clone(),
            self.config.min_roi_area,
        );
        let digits = classifier.classify_groups(&located.working, &located.groups, observer);

        let assembly = assemble::assemble(&digits);
        match &assembly {
            Assembly::Recognized(reading) => {
                log::info!("Read {} card number {}", reading.network, reading.digits)
            }
            Assembly::UnrecognizedNetwork { digits, leading } => {
                log::warn!("Read card number {} with unknown network prefix '{}'", digits, leading)
            }
            Assembly::NotFound => log::debug!(
                "Recognized {} digits in {} groups, expected {}",
                digits.len(),
                located.groups.len(),
                assemble::CARD_DIGITS
            ),
        }
        assembly
    }

    /// Locate the card in a raw frame, then read it. Later stages only run
    /// when a card outline was found.
    pub fn scan_frame(&self, frame: &DynamicImage) -> Assembly {
        self.scan_frame_observed(frame, &mut NoopObserver)
    }

    pub fn scan_frame_observed(&self, frame: &DynamicImage, observer: &mut dyn StageObserver) -> Assembly {
        match self.locate_card_observed(frame, observer) {
            Some(card) => self.read_card_observed(&card.image, observer),
            None => Assembly::NotFound,
        }
    }
}
