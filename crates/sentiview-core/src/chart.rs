#![forbid(unsafe_code)]

//! Conic pie chart and legend for a probability triple.
//!
//! Segments are painted from 0° up to each cumulative boundary in category
//! order (negative, neutral, positive), so each later segment covers the one
//! before it up to its own boundary. The boundaries are not corrected when
//! they do not add up to exactly 360°.

use core::time::Duration;
use std::fmt::Write as _;

use crate::dom::Dom;
use crate::timing::{FadeScheduler, OPACITY_HIDDEN};
use crate::triple::{Category, ProbabilityTriple};

/// Opaque RGB color packed as `0x00RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartColor(pub u32);

impl ChartColor {
    pub const NEGATIVE: Self = Self::rgb(0xd2, 0x0e, 0x0f);
    pub const NEUTRAL: Self = Self::rgb(0xfe, 0x81, 0x00);
    pub const POSITIVE: Self = Self::rgb(0x00, 0xaf, 0x12);

    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    #[must_use]
    pub const fn for_category(category: Category) -> Self {
        match category {
            Category::Negative => Self::NEGATIVE,
            Category::Neutral => Self::NEUTRAL,
            Category::Positive => Self::POSITIVE,
        }
    }

    /// CSS hex notation, e.g. `#d20e0f`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:06x}", self.0 & 0x00FF_FFFF)
    }
}

/// One painted region: from `start_angle_deg` (always 0) to its cumulative boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartSegment {
    pub category: Category,
    pub color: ChartColor,
    pub start_angle_deg: f64,
    pub end_angle_deg: f64,
}

/// One legend line.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub category: Category,
    pub color: ChartColor,
    pub label: String,
}

/// Elements appended by [`PieChart::render_into`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart<N> {
    pub chart: N,
    pub legend: N,
}

/// Pie chart description for one triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieChart {
    triple: ProbabilityTriple,
}

impl PieChart {
    #[must_use]
    pub const fn new(triple: ProbabilityTriple) -> Self {
        Self { triple }
    }

    #[must_use]
    pub const fn triple(&self) -> &ProbabilityTriple {
        &self.triple
    }

    /// Cumulative boundaries `[b1, b2, b3]` in degrees.
    #[must_use]
    pub fn boundaries(&self) -> [f64; 3] {
        let [neg, neu, pos] = self.triple.fractions().map(|fraction| fraction * 360.0);
        [neg, neg + neu, neg + neu + pos]
    }

    #[must_use]
    pub fn segments(&self) -> [ChartSegment; 3] {
        let bounds = self.boundaries();
        Category::ALL.map(|category| ChartSegment {
            category,
            color: ChartColor::for_category(category),
            start_angle_deg: 0.0,
            end_angle_deg: bounds[category as usize],
        })
    }

    #[must_use]
    pub fn legend(&self) -> [LegendEntry; 3] {
        Category::ALL.map(|category| LegendEntry {
            category,
            color: ChartColor::for_category(category),
            label: format!(
                "{} comments ({}%)",
                category.name(),
                self.triple.get(category) * 100.0
            ),
        })
    }

    /// CSS `background-image` value painting the segments in order.
    #[must_use]
    pub fn conic_gradient(&self) -> String {
        let mut css = String::from("conic-gradient(");
        for (i, segment) in self.segments().iter().enumerate() {
            if i > 0 {
                css.push_str(", ");
            }
            let _ = write!(
                css,
                "{} {} {}deg",
                segment.color.to_hex(),
                segment.start_angle_deg,
                segment.end_angle_deg
            );
        }
        css.push(')');
        css
    }

    /// Append the legend list and the chart to `container`, both hidden,
    /// and schedule their fade-in.
    pub fn render_into<D: Dom>(
        &self,
        dom: &mut D,
        container: &D::Node,
        scheduler: &mut FadeScheduler<D::Node>,
        now: Duration,
    ) -> Result<RenderedChart<D::Node>, D::Error> {
        let legend = dom.create_element("ul")?;
        dom.set_class(&legend, "labels-list")?;
        dom.set_style(&legend, "opacity", OPACITY_HIDDEN)?;
        for entry in self.legend() {
            let item = dom.create_element("li")?;
            dom.set_class(&item, "labels-item font")?;
            dom.set_style(&item, "color", &entry.color.to_hex())?;
            dom.set_text(&item, &entry.label)?;
            dom.append_child(&legend, &item)?;
        }
        dom.append_child(container, &legend)?;
        scheduler.fade_in(now, legend.clone());

        let chart = dom.create_element("div")?;
        dom.set_class(&chart, "piechart")?;
        dom.set_style(&chart, "opacity", OPACITY_HIDDEN)?;
        dom.set_style(&chart, "background-image", &self.conic_gradient())?;
        dom.append_child(container, &chart)?;
        scheduler.fade_in(now, chart.clone());

        Ok(RenderedChart { chart, legend })
    }
}
