pub mod python_cli;
