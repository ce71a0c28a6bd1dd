use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{self, Align2, Color32, FontId, Sense, Shape, Stroke, Ui, Vec2};
use egui_plot::{Bar as PlotBar, BarChart, Plot, Points};

use crate::color::{generate_palette, BAR_FILL, MAP_MARKER};
use crate::data::chart::{BarSeries, MapData, PieSeries};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 360.0;

/// Distance the emphasised pie slice is pulled out, relative to the radius.
const EXPLODE: f32 = 0.10;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the chart area in the central panel.
pub fn charts_panel(ui: &mut Ui, state: &mut AppState) {
    if state.table.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a dataset to explore establishments  (File → Open CSV…)");
        });
        return;
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Medical Establishment Licenses in Massachusetts");
            ui.add_space(4.0);

            if state.criteria.has_selection() {
                selection_charts(ui, state);
            } else {
                ui.label("Select at least one license type and one city in the side panel.");
            }

            ui.separator();
            ui.checkbox(
                &mut state.toggles.top_cities,
                "View cities with most establishments",
            );
            if state.toggles.top_cities {
                ui.strong("Cities with the Highest Number of Establishments");
                bar_chart(ui, "top_cities", &state.top_cities, "Number of Establishments");
            }
        });
}

fn selection_charts(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Select the data you want to view:");
    ui.horizontal(|ui: &mut Ui| {
        ui.checkbox(&mut state.toggles.map, "View Map");
        ui.checkbox(&mut state.toggles.pie, "View Pie Chart");
        ui.checkbox(&mut state.toggles.bar, "View Bar Chart");
    });

    if state.charts.visible == 0 {
        ui.label("No establishments match the current selection.");
        return;
    }

    if state.toggles.map {
        ui.strong("Map of Medicine Business Locations in Massachusetts");
        map_plot(ui, &state.charts.map);
    }
    if state.toggles.pie {
        ui.strong("Market Share Pie Chart");
        pie_chart(ui, &state.charts.pie);
    }
    if state.toggles.bar {
        ui.strong("Average License Payment Bar Chart");
        bar_chart(ui, "average_payment", &state.charts.bar, "Average Payment");
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Scatter establishments by longitude/latitude around their mean position.
fn map_plot(ui: &mut Ui, map: &MapData) {
    let Some((center_lat, center_lon)) = map.center() else {
        return;
    };

    Plot::new("establishment_map")
        .height(CHART_HEIGHT)
        .data_aspect(1.0)
        .include_x(center_lon)
        .include_y(center_lat)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .label_formatter(|name, value| {
            if name.is_empty() {
                format!("{:.4}, {:.4}", value.y, value.x)
            } else {
                format!("Establishment Name:\n{name}")
            }
        })
        .show(ui, |plot_ui| {
            for point in &map.points {
                let marker = Points::new(vec![[point.longitude, point.latitude]])
                    .name(&point.business_name)
                    .radius(4.0)
                    .color(MAP_MARKER);
                plot_ui.points(marker);
            }
        });
}

// ---------------------------------------------------------------------------
// Pie
// ---------------------------------------------------------------------------

/// Painter-drawn pie with percentage labels; the emphasised slice is
/// pulled out of the pie.
fn pie_chart(ui: &mut Ui, pie: &PieSeries) {
    let total = pie.total();
    if total == 0 {
        ui.label("None of the selected cities has matching establishments.");
        return;
    }

    let labels: Vec<&str> = pie.slices.iter().map(|s| s.label.as_str()).collect();
    ui.label(format!("Market Share of Cities: {}", labels.join(", ")));

    let size = Vec2::new(ui.available_width(), CHART_HEIGHT);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let rect = response.rect;
    let radius = rect.width().min(rect.height()) * 0.35;
    let text_color = ui.visuals().text_color();
    let colors = generate_palette(pie.slices.len());

    let mut start = -FRAC_PI_2;
    for (i, (slice, color)) in pie.slices.iter().zip(colors).enumerate() {
        if slice.count == 0 {
            continue;
        }
        let share = slice.count as f32 / total as f32;
        let sweep = share * TAU;
        let mid = start + sweep / 2.0;
        let origin = if pie.emphasis == Some(i) {
            rect.center() + Vec2::angled(mid) * radius * EXPLODE
        } else {
            rect.center()
        };

        // Triangle fan; each piece stays convex.
        let steps = (share * 96.0).ceil().max(1.0) as usize;
        for step in 0..steps {
            let a0 = start + sweep * step as f32 / steps as f32;
            let a1 = start + sweep * (step + 1) as f32 / steps as f32;
            painter.add(Shape::convex_polygon(
                vec![
                    origin,
                    origin + Vec2::angled(a0) * radius,
                    origin + Vec2::angled(a1) * radius,
                ],
                color,
                Stroke::NONE,
            ));
        }

        painter.text(
            origin + Vec2::angled(mid) * radius * 0.6,
            Align2::CENTER_CENTER,
            format!("{:.2}", share * 100.0),
            FontId::proportional(12.0),
            Color32::BLACK,
        );
        painter.text(
            origin + Vec2::angled(mid) * radius * 1.2,
            Align2::CENTER_CENTER,
            &slice.label,
            FontId::proportional(13.0),
            text_color,
        );
        start += sweep;
    }
}

// ---------------------------------------------------------------------------
// Bars
// ---------------------------------------------------------------------------

/// One bar per city, city names on the x axis.
fn bar_chart(ui: &mut Ui, id: &str, series: &BarSeries, y_label: &str) {
    let labels = series.labels();
    let title: Vec<&str> = labels.iter().map(String::as_str).collect();
    ui.label(title.join(", "));

    let bars: Vec<PlotBar> = series
        .bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            PlotBar::new(i as f64, bar.value)
                .name(&bar.label)
                .fill(BAR_FILL)
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label("City")
        .y_axis_label(y_label)
        .allow_drag(false)
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _range| {
            let slot = mark.value.round();
            if (mark.value - slot).abs() > 1e-6 || slot < 0.0 {
                return String::new();
            }
            labels.get(slot as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).width(0.6));
        });
}
