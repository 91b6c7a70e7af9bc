mod release;
mod state;
