//! Synthetic three-road highway: a main carriageway `A` that either
//! continues into `B` or leaves through the exit road `C`.

use tq_core::{LaneType, RouteElement};
use tq_scenery::{LaneSpec, RoadSpec, Scenery, SceneryResult};

pub const MAIN: &str = "A";
pub const CONTINUATION: &str = "B";
pub const EXIT: &str = "C";

pub fn build_highway() -> SceneryResult<Scenery> {
    let main = RoadSpec::straight(MAIN, 500.0)
        .section(0.0, 350.0, vec![
            LaneSpec::driving(-1, 3.5),
            LaneSpec::driving(-2, 3.5),
            LaneSpec::new(-3, 2.5, LaneType::Shoulder),
        ])
        // Exit lane opens for the last 150 m.
        .section(350.0, 500.0, vec![
            LaneSpec::driving(-1, 3.5),
            LaneSpec::driving(-2, 3.5),
            LaneSpec::new(-3, 3.5, LaneType::Exit),
        ]);
    let continuation = RoadSpec::straight(CONTINUATION, 400.0)
        .at(500.0, 0.0, 0.0)
        .lanes(vec![LaneSpec::driving(-1, 3.5), LaneSpec::driving(-2, 3.5)]);
    let exit = RoadSpec::straight(EXIT, 250.0)
        .at(500.0, -10.0, -0.2)
        .lanes(vec![LaneSpec::new(-1, 3.5, LaneType::OffRamp)]);

    Scenery::builder()
        .road(main)
        .road(continuation)
        .road(exit)
        .connect_weighted(RouteElement::new(MAIN, true), RouteElement::new(CONTINUATION, true), 3.0)
        .connect_weighted(RouteElement::new(MAIN, true), RouteElement::new(EXIT, true), 1.0)
        .build()
}
