pub mod solar_routes;
